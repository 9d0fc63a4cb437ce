/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use dark_theme::modify_colors::{modify_border_color, modify_foreground_color};
use dark_theme::{
    DeclarationKind, ModifiableCssDeclaration, ModificationCache, ModifierContext, Rgba, Theme,
    VariablesStore, get_modifiable_css_declaration,
};

const WHITE: Rgba = Rgba::new(255.0, 255.0, 255.0, 1.0);

fn classify(property: &str, value: &str, cache: &ModificationCache) -> Option<ModifiableCssDeclaration> {
    get_modifiable_css_declaration(property, value, false, &ModifierContext::default(), cache)
}

fn apply(declaration: &ModifiableCssDeclaration) -> String {
    (declaration.modifier)(&Theme::default())
        .ready()
        .expect("modifier should not need image analysis")
}

#[test]
fn css_wide_keywords_are_left_alone() {
    let cache = ModificationCache::new();
    for value in ["", "  ", "inherit", "initial", "unset"] {
        assert!(classify("color", value, &cache).is_none(), "{value:?}");
    }
    assert!(cache.is_empty());
}

#[test]
fn text_color_is_recolored() {
    let cache = ModificationCache::new();
    let declaration = classify("color", "red", &cache).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::TextColor);
    assert_eq!(declaration.source_value, "red");
    let value = apply(&declaration);
    assert_ne!(value, "red");
    assert!(value.starts_with("rgb("), "{value}");

    let declaration = classify("color", "#000", &cache).unwrap();
    assert_eq!(apply(&declaration), "rgb(232, 230, 227)");
}

#[test]
fn background_colors() {
    let cache = ModificationCache::new();
    let declaration = classify("background-color", "white", &cache).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::BackgroundColor);
    assert_eq!(apply(&declaration), "rgb(24, 26, 27)");

    let declaration = classify("background", "#fff", &cache).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::Background);
    assert_eq!(apply(&declaration), "rgb(24, 26, 27)");

    assert!(classify("background-position", "0 0", &cache).is_none());
    assert!(classify("background-color", "currentcolor", &cache).is_none());
}

#[test]
fn border_shorthand_recolors_color_tokens() {
    let cache = ModificationCache::new();
    let theme = Theme::default();
    let declaration = classify("border-left", "1px solid white", &cache).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::Border);
    assert_eq!(
        apply(&declaration),
        format!("1px solid {}", modify_border_color(&WHITE, &theme))
    );
    assert!(classify("outline", "none", &cache).is_none());
}

#[test]
fn unrelated_properties_are_skipped() {
    let cache = ModificationCache::new();
    assert!(classify("width", "10px", &cache).is_none());
    assert!(classify("display", "block", &cache).is_none());
    assert!(classify("cursor", "pointer", &cache).is_none());
}

#[test]
fn solid_color_modifiers_are_memoized() {
    let cache = ModificationCache::new();
    let first = classify("color", "red", &cache).unwrap();
    let second = classify("fill", "red", &cache).unwrap();
    assert!(Rc::ptr_eq(&first.modifier, &second.modifier));
    assert_eq!(cache.generic_len(), 1);

    classify("background-color", "red", &cache).unwrap();
    assert_eq!(cache.generic_len(), 2);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn variables_take_priority() {
    let cache = ModificationCache::new();
    let mut variables = VariablesStore::new();
    variables.define("--text", "black");
    let context = ModifierContext {
        variables: Some(&variables),
        ..ModifierContext::default()
    };

    let declaration =
        get_modifiable_css_declaration("color", "var(--text)", true, &context, &cache).unwrap();
    assert_eq!(declaration.kind, DeclarationKind::VarDependant);
    assert!(declaration.important);
    assert_eq!(
        apply(&declaration),
        modify_foreground_color(&Rgba::new(0.0, 0.0, 0.0, 1.0), &Theme::default())
    );

    assert!(get_modifiable_css_declaration("color", "var(--nope)", false, &context, &cache).is_none());
    assert!(classify("color", "var(--text)", &cache).is_none());
}
