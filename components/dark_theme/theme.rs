/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User-facing theme parameters consumed by every color modifier.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

/// Theme as stored in the user's settings file.
///
/// Percentages are plain numbers (`100` is the identity for brightness and
/// contrast, `0` for grayscale and sepia). Scheme colors are any CSS color.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub mode: ThemeMode,
    pub brightness: f32,
    pub contrast: f32,
    pub grayscale: f32,
    pub sepia: f32,
    pub dark_scheme_background_color: String,
    pub dark_scheme_text_color: String,
    pub light_scheme_background_color: String,
    pub light_scheme_text_color: String,
    /// A CSS color, or `auto` to derive it from the scheme.
    pub selection_color: String,
    pub style_system_controls: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Dark,
            brightness: 100.0,
            contrast: 100.0,
            grayscale: 0.0,
            sepia: 0.0,
            dark_scheme_background_color: "#181a1b".to_owned(),
            dark_scheme_text_color: "#e8e6e3".to_owned(),
            light_scheme_background_color: "#dcdad7".to_owned(),
            light_scheme_text_color: "#181a1b".to_owned(),
            selection_color: "auto".to_owned(),
            style_system_controls: true,
        }
    }
}

impl Theme {
    /// Parse a theme from its JSON settings form. Missing fields keep their
    /// defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let theme = Theme::from_json(r#"{"mode": "light", "brightness": 110, "darkSchemeTextColor": "white"}"#)
            .unwrap();
        assert_eq!(theme.mode, ThemeMode::Light);
        assert_eq!(theme.brightness, 110.0);
        assert_eq!(theme.dark_scheme_text_color, "white");
        assert_eq!(theme.contrast, 100.0);
        assert_eq!(theme.dark_scheme_background_color, "#181a1b");
    }

    #[test]
    fn round_trips_through_json() {
        let theme = Theme {
            sepia: 20.0,
            ..Theme::default()
        };
        assert_eq!(Theme::from_json(&serde_json::to_string(&theme).unwrap()).unwrap(), theme);
    }
}
