/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Custom property definitions and modifiers for values using `var()`.

use log::debug;
use rustc_hash::FxHashMap;

use crate::cache::ModificationCache;
use crate::css_rules::{CssRule, iterate_style_rules};
use crate::css_text::find_functions;
use crate::modify_css::{Modifier, ModifierContext, get_modifiable_css_declaration};

/// References nested deeper than this are treated as cycles.
const MAX_VAR_DEPTH: usize = 16;

/// Supplies modifiers for declarations whose value depends on custom
/// properties.
pub trait VariableStore {
    fn get_modifier_for_var_dependant(
        &self,
        property: &str,
        value: &str,
        context: &ModifierContext,
        cache: &ModificationCache,
    ) -> Option<Modifier>;
}

/// Custom properties collected from stylesheets. Later definitions of the
/// same name win, as in the cascade for equally specific rules.
#[derive(Clone, Debug, Default)]
pub struct VariablesStore {
    definitions: FxHashMap<String, String>,
}

impl VariablesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[CssRule]) -> Self {
        let mut store = Self::new();
        store.add_rules(rules);
        store
    }

    pub fn add_rules(&mut self, rules: &[CssRule]) {
        iterate_style_rules(rules, &mut |rule| {
            for declaration in &rule.declarations {
                if declaration.property.starts_with("--") {
                    self.define(&declaration.property, &declaration.value);
                }
            }
        });
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.definitions.insert(name.to_owned(), value.trim().to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.definitions.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Substitute every `var()` in `value`, using fallbacks for undefined
    /// names. `None` if a name is undefined without fallback or the
    /// references are cyclic.
    pub fn resolve(&self, value: &str) -> Option<String> {
        self.resolve_with_depth(value, 0)
    }

    fn resolve_with_depth(&self, value: &str, depth: usize) -> Option<String> {
        if depth > MAX_VAR_DEPTH {
            debug!("Giving up on deeply nested var() in {value}");
            return None;
        }
        let calls = find_functions(value, |name| name.eq_ignore_ascii_case("var"));
        if calls.is_empty() {
            return Some(value.to_owned());
        }

        let mut result = String::with_capacity(value.len());
        let mut last = 0;
        for call in calls {
            result.push_str(&value[last..call.range.start]);
            let arguments = &value[call.arguments.clone()];
            let (name, fallback) = match arguments.split_once(',') {
                Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
                None => (arguments.trim(), None),
            };
            let substitution = match (self.get(name), fallback) {
                (Some(defined), _) => defined,
                (None, Some(fallback)) => fallback,
                (None, None) => {
                    debug!("Undefined custom property {name}");
                    return None;
                },
            };
            result.push_str(&self.resolve_with_depth(substitution, depth + 1)?);
            last = call.range.end;
        }
        result.push_str(&value[last..]);
        Some(result)
    }
}

impl VariableStore for VariablesStore {
    fn get_modifier_for_var_dependant(
        &self,
        property: &str,
        value: &str,
        context: &ModifierContext,
        cache: &ModificationCache,
    ) -> Option<Modifier> {
        let resolved = self.resolve(value)?;
        let context = ModifierContext {
            variables: None,
            ..context.clone()
        };
        get_modifiable_css_declaration(property, &resolved, false, &context, cache)
            .map(|declaration| declaration.modifier)
    }
}
