/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Background image analysis for images on the local file system.

use std::cell::RefCell;

use dark_theme::{ImageAnalyzer, ImageDetails};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use url::Url;

use crate::fetch::read_file_url;

/// Images are downscaled to at most this size per side before sampling.
const MAX_ANALYZE_SIZE: u32 = 32;
const LARGE_IMAGE_PIXELS: u64 = 480 * 480;
const TRANSPARENT_ALPHA_THRESHOLD: u8 = 13;
const DARK_LIGHTNESS_THRESHOLD: f32 = 0.4;
const LIGHT_LIGHTNESS_THRESHOLD: f32 = 0.7;
/// Share of pixels needed to call an image dark, light or transparent.
const DOMINANT_SHARE: f32 = 0.7;
const TRANSPARENT_SHARE: f32 = 0.1;

pub(crate) fn analyze_image(image: &DynamicImage) -> ImageDetails {
    let (width, height) = image.dimensions();
    let sample = image.thumbnail(MAX_ANALYZE_SIZE, MAX_ANALYZE_SIZE).to_rgba8();

    let mut total = 0usize;
    let mut transparent = 0usize;
    let mut dark = 0usize;
    let mut light = 0usize;
    for pixel in sample.pixels() {
        let [r, g, b, a] = pixel.0;
        total += 1;
        if a < TRANSPARENT_ALPHA_THRESHOLD {
            transparent += 1;
            continue;
        }
        let lightness = (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0;
        if lightness < DARK_LIGHTNESS_THRESHOLD {
            dark += 1;
        } else if lightness > LIGHT_LIGHTNESS_THRESHOLD {
            light += 1;
        }
    }

    let opaque = total - transparent;
    let share = |count: usize, of: usize| if of == 0 { 0.0 } else { count as f32 / of as f32 };
    ImageDetails {
        is_dark: share(dark, opaque) >= DOMINANT_SHARE,
        is_light: share(light, opaque) >= DOMINANT_SHARE,
        is_transparent: share(transparent, total) >= TRANSPARENT_SHARE,
        is_large: u64::from(width) * u64::from(height) >= LARGE_IMAGE_PIXELS,
    }
}

/// Decodes `file:` images. Results are remembered per URL for the lifetime
/// of the analyzer.
#[derive(Debug, Default)]
pub(crate) struct FileImageAnalyzer {
    results: RefCell<FxHashMap<Url, Option<ImageDetails>>>,
}

impl FileImageAnalyzer {
    fn analyze_now(&self, url: &Url) -> Option<ImageDetails> {
        if url.scheme() != "file" {
            debug!("Not analyzing remote image {url}");
            return None;
        }
        let bytes = read_file_url(url)
            .inspect_err(|error| warn!("Cannot analyze image: {error}"))
            .ok()?;
        let image = image::load_from_memory(&bytes)
            .inspect_err(|error| warn!("Cannot decode {url}: {error}"))
            .ok()?;
        let details = analyze_image(&image);
        debug!("Analyzed {url}: {details:?}");
        Some(details)
    }
}

impl ImageAnalyzer for FileImageAnalyzer {
    fn analyze(&self, url: &Url) -> LocalBoxFuture<'static, Option<ImageDetails>> {
        let cached = self.results.borrow().get(url).copied();
        let details = match cached {
            Some(details) => details,
            None => {
                let details = self.analyze_now(url);
                self.results.borrow_mut().insert(url.clone(), details);
                details
            },
        };
        future::ready(details).boxed_local()
    }
}
