/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::str::FromStr;

use site_fixes::{
    DynamicThemeFix, DynamicThemeFixCommand, NoopCleanupScheduler, SitePropsIndex,
    get_dynamic_theme_fixes_for,
};

const FIXES: &str = "\
*

INVERT
.logo

CSS
.generic {}

================================

example.com

CSS
.example {}

IGNORE INLINE STYLE
.inline

================================

example.com/docs

INVERT
.diagram
";

fn fixes_index(text: &str) -> SitePropsIndex<DynamicThemeFix> {
    SitePropsIndex::with_scheduler(text, Box::new(NoopCleanupScheduler)).unwrap()
}

#[test]
fn test_command_names() {
    assert_eq!(
        DynamicThemeFixCommand::from_str("IGNORE IMAGE ANALYSIS"),
        Ok(DynamicThemeFixCommand::IgnoreImageAnalysis)
    );
    assert_eq!(DynamicThemeFixCommand::Css.to_string(), "CSS");
    assert!(DynamicThemeFixCommand::from_str("css").is_err());
}

#[test]
fn test_generic_fix_only() {
    let index = fixes_index(FIXES);
    let fix = get_dynamic_theme_fixes_for("https://unrelated.org/", &index).unwrap();
    assert_eq!(fix.url, ["*"]);
    assert_eq!(fix.invert, [".logo"]);
    assert_eq!(fix.css, ".generic {}");
}

#[test]
fn test_generic_fix_merged_with_site_fix() {
    let index = fixes_index(FIXES);
    let fix = get_dynamic_theme_fixes_for("https://example.com/", &index).unwrap();
    assert_eq!(fix.url, ["example.com"]);
    assert_eq!(fix.invert, [".logo"]);
    assert_eq!(fix.css, ".generic {}\n.example {}");
    assert_eq!(fix.ignore_inline_style, [".inline"]);
}

#[test]
fn test_most_specific_fix_wins() {
    let index = fixes_index(FIXES);
    let fix = get_dynamic_theme_fixes_for("https://example.com/docs/intro", &index).unwrap();
    assert_eq!(fix.url, ["example.com/docs"]);
    assert_eq!(fix.invert, [".logo", ".diagram"]);
    assert_eq!(fix.css, ".generic {}");
    assert!(fix.ignore_inline_style.is_empty());
}

#[test]
fn test_no_generic_record() {
    let index = fixes_index("example.com\n\nCSS\n.example {}\n");
    assert_eq!(get_dynamic_theme_fixes_for("https://example.com/", &index), None);
}
