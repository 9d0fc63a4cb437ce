/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Background image analysis hooks.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use log::debug;
use url::Url;

use crate::theme::{Theme, ThemeMode};

/// What an analyzer found out about an image.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ImageDetails {
    pub is_dark: bool,
    pub is_light: bool,
    pub is_transparent: bool,
    pub is_large: bool,
}

/// Fetches and inspects images referenced from stylesheets. Analysis is
/// allowed to take a network round trip, hence the future.
pub trait ImageAnalyzer {
    /// `None` when the image could not be loaded or decoded.
    fn analyze(&self, url: &Url) -> LocalBoxFuture<'static, Option<ImageDetails>>;
}

/// Returns `true` once an asynchronous result is no longer wanted, e.g.
/// because a newer render started or the stylesheet went away.
pub type CancellationCheck = Rc<dyn Fn() -> bool>;

pub(crate) fn css_url(url: &Url) -> String {
    format!("url(\"{url}\")")
}

/// The CSS to write in place of an analyzed image. Large light opaque images
/// would light up the whole page in dark mode, so they are dropped.
pub(crate) fn image_replacement(url: &Url, details: Option<&ImageDetails>, theme: &Theme) -> String {
    match details {
        Some(details)
            if theme.mode == ThemeMode::Dark &&
                details.is_light &&
                details.is_large &&
                !details.is_transparent =>
        {
            debug!("Hiding large light background image {url}");
            "none".to_owned()
        },
        _ => css_url(url),
    }
}
