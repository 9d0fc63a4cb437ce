/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-site override configuration for the dark theme engine.
//!
//! The fixes configuration is a large flat text document made of records
//! separated by `===` lines. Each record starts with URL patterns followed by
//! UPPERCASE command blocks. Instead of parsing the whole document up front,
//! [`SitePropsIndex`] keeps byte offsets of every record plus a small domain
//! index, and parses records only when a lookup needs them.

pub mod cleanup;
pub mod dynamic_theme_fix;
pub mod index;
pub mod offsets;
pub mod parse;
pub mod site_list;
pub mod text;
pub mod url;

pub use crate::cleanup::{
    CleanupScheduler, INDEX_CACHE_CLEANUP_INTERVAL, NoopCleanupScheduler, TokioCleanupScheduler,
};
pub use crate::dynamic_theme_fix::{
    DynamicThemeFix, DynamicThemeFixCommand, get_dynamic_theme_fixes_for,
};
pub use crate::index::{IndexError, RecordId, SitePropsIndex, index_sites_fixes_config};
pub use crate::parse::{SiteProps, parse_sites_fixes_config};
pub use crate::site_list::{SiteListIndex, index_site_list_config, is_url_in_site_list};
pub use crate::url::get_domain;
