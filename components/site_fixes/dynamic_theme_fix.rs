/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Records of the dynamic theme fixes configuration.
//!
//! ```text
//! *
//!
//! INVERT
//! .logo
//!
//! ================================
//!
//! example.com
//!
//! CSS
//! .header { background: none !important; }
//!
//! IGNORE IMAGE ANALYSIS
//! .banner
//! ```

use std::str::FromStr;

use strum::{Display, EnumString};

use crate::index::SitePropsIndex;
use crate::parse::SiteProps;
use crate::text::parse_array;
use crate::url::is_url_in_list;

#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
pub enum DynamicThemeFixCommand {
    #[strum(serialize = "INVERT")]
    Invert,
    #[strum(serialize = "CSS")]
    Css,
    #[strum(serialize = "IGNORE INLINE STYLE")]
    IgnoreInlineStyle,
    #[strum(serialize = "IGNORE IMAGE ANALYSIS")]
    IgnoreImageAnalysis,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DynamicThemeFix {
    pub url: Vec<String>,
    /// Selectors rendered with an inversion filter instead of recoloring.
    pub invert: Vec<String>,
    /// Extra CSS appended to the generated stylesheet.
    pub css: String,
    /// Selectors whose inline `style` attributes are left alone.
    pub ignore_inline_style: Vec<String>,
    /// Selectors whose background images are not analyzed.
    pub ignore_image_analysis: Vec<String>,
}

impl SiteProps for DynamicThemeFix {
    fn urls(&self) -> &[String] {
        &self.url
    }

    fn set_urls(&mut self, urls: Vec<String>) {
        self.url = urls;
    }

    fn apply_command(&mut self, command: &str, value: &str) -> bool {
        let Ok(command) = DynamicThemeFixCommand::from_str(command) else {
            return false;
        };
        match command {
            DynamicThemeFixCommand::Invert => self.invert = parse_array(value),
            DynamicThemeFixCommand::Css => self.css = value.trim().to_owned(),
            DynamicThemeFixCommand::IgnoreInlineStyle => {
                self.ignore_inline_style = parse_array(value)
            },
            DynamicThemeFixCommand::IgnoreImageAnalysis => {
                self.ignore_image_analysis = parse_array(value)
            },
        }
        true
    }
}

impl DynamicThemeFix {
    fn is_generic(&self) -> bool {
        self.url.first().is_some_and(|url| url == "*")
    }

    /// Layer `specific` on top of `self`: lists are concatenated, CSS is
    /// joined with a newline, URLs come from `specific`.
    pub fn merged_with(&self, specific: &DynamicThemeFix) -> DynamicThemeFix {
        let concat = |a: &[String], b: &[String]| -> Vec<String> { a.iter().chain(b).cloned().collect() };
        let css = [self.css.as_str(), specific.css.as_str()]
            .into_iter()
            .filter(|css| !css.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        DynamicThemeFix {
            url: specific.url.clone(),
            invert: concat(&self.invert, &specific.invert),
            css,
            ignore_inline_style: concat(&self.ignore_inline_style, &specific.ignore_inline_style),
            ignore_image_analysis: concat(
                &self.ignore_image_analysis,
                &specific.ignore_image_analysis,
            ),
        }
    }
}

/// The effective fix for `url`: the generic `*` record merged with the most
/// specific matching record (the one with the longest first URL rule).
/// Returns `None` when the config has no generic record.
pub fn get_dynamic_theme_fixes_for(
    url: &str,
    index: &SitePropsIndex<DynamicThemeFix>,
) -> Option<DynamicThemeFix> {
    let fixes = index.get_sites_fixes_for(url);
    let generic = fixes.iter().find(|fix| fix.is_generic())?;

    let most_specific = fixes
        .iter()
        .filter(|fix| !fix.is_generic() && is_url_in_list(url, &fix.url))
        .max_by_key(|fix| fix.url.first().map_or(0, String::len));

    Some(match most_specific {
        Some(specific) => generic.merged_with(specific),
        None => DynamicThemeFix::clone(generic),
    })
}
