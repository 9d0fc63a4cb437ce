/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use dark_theme::modify_colors::modify_shadow_color;
use dark_theme::{ModificationCache, Rgba, Theme, get_shadow_modifier_with_info};

fn shadow(value: &str, cache: &ModificationCache) -> Option<String> {
    let modifier = get_shadow_modifier_with_info(value, cache)?;
    modifier(&Theme::default()).ready()
}

#[test]
fn none_has_no_modifier() {
    let cache = ModificationCache::new();
    assert_eq!(shadow("none", &cache), None);
    assert_eq!(shadow("", &cache), None);
}

#[test]
fn every_layer_is_recolored() {
    let cache = ModificationCache::new();
    let theme = Theme::default();
    let black = modify_shadow_color(&Rgba::new(0.0, 0.0, 0.0, 0.5), &theme);
    let white = modify_shadow_color(&Rgba::new(255.0, 255.0, 255.0, 1.0), &theme);
    assert_eq!(
        shadow("0 0 2px rgba(0, 0, 0, 0.5),inset 1px 1px white", &cache).unwrap(),
        format!("0 0 2px {black}, inset 1px 1px {white}")
    );
}

#[test]
fn layers_without_color_pass_through() {
    let cache = ModificationCache::new();
    let white = modify_shadow_color(&Rgba::new(255.0, 255.0, 255.0, 1.0), &Theme::default());
    assert_eq!(
        shadow("1px 1px 2px, 0 0 1px #fff", &cache).unwrap(),
        format!("1px 1px 2px, 0 0 1px {white}")
    );
}

#[test]
fn modifiers_are_cached_by_value() {
    let cache = ModificationCache::new();
    shadow("0 1px red", &cache);
    shadow("0 1px red", &cache);
    assert_eq!(cache.shadow_len(), 1);
    shadow("0 1px RED", &cache);
    assert_eq!(cache.shadow_len(), 2);
}
