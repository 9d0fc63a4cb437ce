/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-session memoization of compiled modifiers and parsed colors.
//!
//! Keys are the exact value text, so `red` and `RED` are cached separately.
//! Entries never depend on the theme: modifiers take it when invoked. A theme
//! change or navigation clears everything at once with
//! [`ModificationCache::clear`], which must not be called in the middle of a
//! render pass.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::color::{Rgba, parse_color};
use crate::modify_css::Modifier;

type ModifierMap = RefCell<FxHashMap<String, Modifier>>;

#[derive(Default)]
pub struct ModificationCache {
    generic: ModifierMap,
    shadow: ModifierMap,
    gradient: ModifierMap,
    colors: RefCell<FxHashMap<String, Option<Rgba>>>,
}

fn lookup(map: &ModifierMap, key: &str) -> Option<Modifier> {
    map.borrow().get(key).cloned()
}

impl ModificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached modifier and color.
    pub fn clear(&self) {
        self.generic.borrow_mut().clear();
        self.shadow.borrow_mut().clear();
        self.gradient.borrow_mut().clear();
        self.colors.borrow_mut().clear();
    }

    /// [`parse_color`], memoized. Failures are remembered too.
    pub fn parse_color(&self, text: &str) -> Option<Rgba> {
        if let Some(color) = self.colors.borrow().get(text) {
            return *color;
        }
        let color = parse_color(text);
        self.colors.borrow_mut().insert(text.to_owned(), color);
        color
    }

    pub(crate) fn get_or_insert_generic(
        &self,
        key: String,
        build: impl FnOnce() -> Modifier,
    ) -> Modifier {
        if let Some(modifier) = lookup(&self.generic, &key) {
            return modifier;
        }
        let modifier = build();
        self.generic.borrow_mut().insert(key, modifier.clone());
        modifier
    }

    pub(crate) fn shadow(&self, key: &str) -> Option<Modifier> {
        lookup(&self.shadow, key)
    }

    pub(crate) fn insert_shadow(&self, key: String, modifier: Modifier) {
        self.shadow.borrow_mut().insert(key, modifier);
    }

    pub(crate) fn gradient(&self, key: &str) -> Option<Modifier> {
        lookup(&self.gradient, key)
    }

    pub(crate) fn insert_gradient(&self, key: String, modifier: Modifier) {
        self.gradient.borrow_mut().insert(key, modifier);
    }

    pub fn generic_len(&self) -> usize {
        self.generic.borrow().len()
    }

    pub fn shadow_len(&self) -> usize {
        self.shadow.borrow().len()
    }

    pub fn gradient_len(&self) -> usize {
        self.gradient.borrow().len()
    }

    pub fn color_len(&self) -> usize {
        self.colors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generic_len() == 0 &&
            self.shadow_len() == 0 &&
            self.gradient_len() == 0 &&
            self.color_len() == 0
    }
}

impl fmt::Debug for ModificationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModificationCache")
            .field("generic", &self.generic_len())
            .field("shadow", &self.shadow_len())
            .field("gradient", &self.gradient_len())
            .field("colors", &self.color_len())
            .finish()
    }
}
