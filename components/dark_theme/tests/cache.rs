/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use dark_theme::{ModificationCache, ModifierContext, Rgba, get_modifiable_css_declaration};

#[test]
fn parsed_colors_are_memoized() {
    let cache = ModificationCache::new();
    assert_eq!(cache.parse_color("#f00"), Some(Rgba::new(255.0, 0.0, 0.0, 1.0)));
    assert_eq!(cache.parse_color("#f00"), Some(Rgba::new(255.0, 0.0, 0.0, 1.0)));
    assert_eq!(cache.parse_color("nonsense"), None);
    assert_eq!(cache.color_len(), 2);
}

#[test]
fn clear_empties_every_map() {
    let cache = ModificationCache::new();
    let context = ModifierContext::default();
    for (property, value) in [
        ("color", "red"),
        ("box-shadow", "0 0 1px black"),
        ("background-image", "linear-gradient(white, black)"),
    ] {
        assert!(get_modifiable_css_declaration(property, value, false, &context, &cache).is_some());
    }
    assert_eq!(cache.generic_len(), 1);
    assert_eq!(cache.shadow_len(), 1);
    assert_eq!(cache.gradient_len(), 1);
    assert!(!cache.is_empty());

    cache.clear();
    assert!(cache.is_empty());
    cache.clear();
    assert!(cache.is_empty());
}
