/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `<meta name="theme-color">` handling.

use log::warn;

use crate::cache::ModificationCache;
use crate::modify_colors::modify_background_color;
use crate::theme::Theme;

pub const META_THEME_COLOR_NAME: &str = "theme-color";

/// Remembers the page's own theme color so it can be put back.
#[derive(Clone, Debug, Default)]
pub struct MetaThemeColor {
    source: Option<String>,
}

impl MetaThemeColor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The content to give the meta element for `theme`. The first content
    /// seen is kept as the source, so changing the theme again modifies the
    /// page's color rather than the previously modified one. `None` if the
    /// source is not a valid color.
    pub fn change(&mut self, content: &str, theme: &Theme, cache: &ModificationCache) -> Option<String> {
        let source = self.source.get_or_insert_with(|| content.to_owned());
        let Some(color) = cache.parse_color(source) else {
            warn!("Invalid meta theme color {source}");
            return None;
        };
        Some(modify_background_color(&color, theme))
    }

    /// The original content, forgetting it.
    pub fn restore(&mut self) -> Option<String> {
        self.source.take()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
