/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use dark_theme::css_rules::parse_stylesheet;
use dark_theme::{
    ModificationCache, ModifierContext, Theme, VariableStore, VariablesStore,
};

#[test]
fn definitions_are_collected_from_nested_rules() {
    let rules = parse_stylesheet(
        ":root { --bg: white; --Accent: #00f }\n\
         @media (prefers-color-scheme: light) { :root { --bg: #eee } }\n\
         a { color: var(--Accent) }",
    );
    let store = VariablesStore::from_rules(&rules);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("--bg"), Some("#eee"));
    assert_eq!(store.get("--Accent"), Some("#00f"));
    assert_eq!(store.get("--accent"), None);
}

#[test]
fn modifiers_follow_the_resolved_value() {
    let cache = ModificationCache::new();
    let mut store = VariablesStore::new();
    store.define("--line", "1px solid var(--edge, white)");
    let context = ModifierContext::default();

    let modifier = store
        .get_modifier_for_var_dependant("border", "var(--line)", &context, &cache)
        .unwrap();
    let value = modifier(&Theme::default()).ready().unwrap();
    assert!(value.starts_with("1px solid rgb("), "{value}");

    assert!(
        store
            .get_modifier_for_var_dependant("width", "var(--line)", &context, &cache)
            .is_none()
    );
}
