/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Dynamic dark theme engine.
//!
//! Stylesheets are split into rules and declarations, every declaration is
//! classified and compiled into a [`Modifier`], and invoking the modifiers
//! with a [`Theme`] produces an override stylesheet per managed element.
//! Compiled modifiers are memoized in a [`ModificationCache`] owned by the
//! theming session.

pub mod cache;
pub mod color;
pub mod css_rules;
pub mod css_text;
pub mod image;
pub mod meta_theme_color;
pub mod modify_colors;
pub mod modify_css;
pub mod style_manager;
pub mod theme;
pub mod variables;

pub use crate::cache::ModificationCache;
pub use crate::color::{Rgba, parse_color};
pub use crate::image::{CancellationCheck, ImageAnalyzer, ImageDetails};
pub use crate::meta_theme_color::MetaThemeColor;
pub use crate::modify_css::{
    BgImageValue, DeclarationKind, ModifiableCssDeclaration, Modifier, ModifierContext,
    ModifierResult, RuleContext, get_bg_image_modifier, get_modifiable_css_declaration,
    get_shadow_modifier_with_info,
};
pub use crate::style_manager::{
    CssFetcher, FetchError, PendingRender, RenderEnvironment, StyleElement, StyleManager,
    StyleManagerCallbacks, StyleManagerError, StyleManagerState, StyleMutation, manage_style,
};
pub use crate::theme::{Theme, ThemeMode};
pub use crate::variables::{VariableStore, VariablesStore};
