/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Turning CSS declarations into deferred, theme-parameterized modifiers.
//!
//! A declaration is classified once and yields a [`Modifier`]. Invoking the
//! modifier with a [`Theme`] produces the replacement value, either directly
//! or, when images have to be analyzed first, as a future.

use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};
use log::{debug, info, warn};
use url::Url;

use crate::cache::ModificationCache;
use crate::color::{Rgba, parse_color};
use crate::css_rules::parse_declaration_block;
use crate::css_text::{
    find_colors, find_css_urls, find_functions, get_absolute_url, has_gradient, has_url, has_var,
    is_data_url, is_gradient_function, parse_gradient, split_top_level_commas,
};
use crate::image::{CancellationCheck, ImageAnalyzer, ImageDetails, css_url, image_replacement};
use crate::modify_colors::{
    modify_background_color, modify_border_color, modify_foreground_color, modify_gradient_color,
    modify_shadow_color,
};
use crate::theme::Theme;
use crate::variables::VariableStore;

/// A compiled value transformation. Never mutates shared state, so it can be
/// invoked any number of times, with any theme.
pub type Modifier = Rc<dyn Fn(&Theme) -> ModifierResult>;

pub enum ModifierResult {
    Ready(String),
    /// Resolves to `None` when the value should be left unchanged, for
    /// example because the render it belonged to was cancelled.
    Pending(LocalBoxFuture<'static, Option<String>>),
}

impl ModifierResult {
    /// The value, if it is available without waiting.
    pub fn ready(self) -> Option<String> {
        match self {
            ModifierResult::Ready(value) => Some(value),
            ModifierResult::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ModifierResult::Pending(_))
    }

    pub async fn resolve(self) -> Option<String> {
        match self {
            ModifierResult::Ready(value) => Some(value),
            ModifierResult::Pending(future) => future.await,
        }
    }
}

impl fmt::Debug for ModifierResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierResult::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            ModifierResult::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// The style rule a declaration was found in.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    pub selector_text: &'a str,
    /// Href of the owning stylesheet, `None` for inline `<style>` elements.
    pub stylesheet_href: Option<&'a Url>,
}

/// Everything besides the declaration itself that classification may need.
#[derive(Clone, Default)]
pub struct ModifierContext<'a> {
    pub rule: Option<RuleContext<'a>>,
    pub document_url: Option<&'a Url>,
    pub variables: Option<&'a dyn VariableStore>,
    pub ignored_image_analysis_selectors: &'a [String],
    pub is_cancelled: Option<CancellationCheck>,
    pub image_analyzer: Option<Rc<dyn ImageAnalyzer>>,
}

/// One discovered declaration paired with its deferred modifier.
#[derive(Clone)]
pub struct ModifiableCssDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
    pub source_value: String,
    pub modifier: Modifier,
    pub kind: DeclarationKind,
}

impl fmt::Debug for ModifiableCssDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifiableCssDeclaration")
            .field("property", &self.property)
            .field("value", &self.value)
            .field("important", &self.important)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

const TEXT_COLOR_PROPERTIES: &[&str] = &[
    "color",
    "caret-color",
    "fill",
    "stroke",
    "-webkit-text-fill-color",
    "-webkit-text-stroke-color",
];

const BACKGROUND_PROPERTIES: &[&str] = &[
    "background",
    "background-color",
    "background-image",
    "background-position",
    "background-size",
    "background-repeat",
    "background-attachment",
    "background-origin",
    "background-clip",
];

const BORDER_PROPERTIES: &[&str] = &[
    "border",
    "border-color",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "outline",
    "outline-color",
];

const SHADOW_PROPERTIES: &[&str] = &["box-shadow", "text-shadow", "-webkit-box-shadow"];

const IMAGE_PROPERTIES: &[&str] = &[
    "background-image",
    "background",
    "border-image",
    "border-image-source",
    "content",
    "cursor",
    "list-style-image",
    "-webkit-mask-image",
    "mask-image",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeclarationKind {
    VarDependant,
    TextColor,
    BackgroundColor,
    Border,
    Shadow,
    Background,
    Image,
}

impl DeclarationKind {
    /// Classification order. The first kind producing a modifier wins.
    pub const PRIORITY: [DeclarationKind; 7] = [
        DeclarationKind::VarDependant,
        DeclarationKind::TextColor,
        DeclarationKind::BackgroundColor,
        DeclarationKind::Border,
        DeclarationKind::Shadow,
        DeclarationKind::Background,
        DeclarationKind::Image,
    ];

    /// Whether declarations of `property` can be of this kind at all.
    pub fn accepts_property(self, property: &str) -> bool {
        match self {
            DeclarationKind::VarDependant => true,
            DeclarationKind::TextColor => TEXT_COLOR_PROPERTIES.contains(&property),
            DeclarationKind::BackgroundColor => property == "background-color",
            DeclarationKind::Border => BORDER_PROPERTIES.contains(&property),
            DeclarationKind::Shadow => SHADOW_PROPERTIES.contains(&property),
            DeclarationKind::Background => BACKGROUND_PROPERTIES.contains(&property),
            DeclarationKind::Image => IMAGE_PROPERTIES.contains(&property),
        }
    }

    fn modifier(
        self,
        property: &str,
        value: &str,
        context: &ModifierContext,
        cache: &ModificationCache,
    ) -> Option<Modifier> {
        match self {
            DeclarationKind::VarDependant => {
                if !has_var(value) {
                    return None;
                }
                context
                    .variables?
                    .get_modifier_for_var_dependant(property, value, context, cache)
            },
            DeclarationKind::TextColor => {
                color_modifier(ColorRole::Foreground, value, cache)
            },
            DeclarationKind::BackgroundColor => {
                color_modifier(ColorRole::Background, value, cache)
            },
            DeclarationKind::Border => border_modifier(value, cache),
            DeclarationKind::Shadow => get_shadow_modifier_with_info(value, cache),
            DeclarationKind::Background => {
                if has_url(value) || has_gradient(value) {
                    get_bg_image_modifier(BgImageValue::Text(value.to_owned()), context, cache)
                } else if property == "background" {
                    color_modifier(ColorRole::Background, value, cache)
                } else {
                    None
                }
            },
            DeclarationKind::Image => {
                if !has_url(value) {
                    return None;
                }
                get_bg_image_modifier(BgImageValue::Text(value.to_owned()), context, cache)
            },
        }
    }
}

/// Classify a declaration and build its modifier. Returns `None` for empty
/// and CSS-wide keyword values and for declarations nothing applies to.
pub fn get_modifiable_css_declaration(
    property: &str,
    value: &str,
    important: bool,
    context: &ModifierContext,
    cache: &ModificationCache,
) -> Option<ModifiableCssDeclaration> {
    let trimmed = value.trim();
    if trimmed.is_empty() || matches!(trimmed, "inherit" | "initial" | "unset") {
        return None;
    }

    let (kind, modifier) = DeclarationKind::PRIORITY
        .into_iter()
        .filter(|kind| kind.accepts_property(property))
        .find_map(|kind| Some((kind, kind.modifier(property, value, context, cache)?)))?;

    Some(ModifiableCssDeclaration {
        property: property.to_owned(),
        value: value.to_owned(),
        important,
        source_value: value.to_owned(),
        modifier,
        kind,
    })
}

#[derive(Clone, Copy)]
enum ColorRole {
    Foreground,
    Background,
    Border,
}

impl ColorRole {
    fn key_prefix(self) -> &'static str {
        match self {
            ColorRole::Foreground => "fg:",
            ColorRole::Background => "bg:",
            ColorRole::Border => "border:",
        }
    }

    fn modify(self, color: &Rgba, theme: &Theme) -> String {
        match self {
            ColorRole::Foreground => modify_foreground_color(color, theme),
            ColorRole::Background => modify_background_color(color, theme),
            ColorRole::Border => modify_border_color(color, theme),
        }
    }
}

fn solid_color_modifier(role: ColorRole, color: Rgba) -> Modifier {
    Rc::new(move |theme: &Theme| ModifierResult::Ready(role.modify(&color, theme)))
}

fn color_modifier(role: ColorRole, value: &str, cache: &ModificationCache) -> Option<Modifier> {
    let color = cache.parse_color(value)?;
    let key = format!("{}{value}", role.key_prefix());
    Some(cache.get_or_insert_generic(key, || solid_color_modifier(role, color)))
}

/// Border and outline values are either a bare color or a shorthand like
/// `1px solid #ccc`, in which every color token is recolored in place.
fn border_modifier(value: &str, cache: &ModificationCache) -> Option<Modifier> {
    if let Some(modifier) = color_modifier(ColorRole::Border, value, cache) {
        return Some(modifier);
    }
    let colors = find_colors(value);
    if colors.is_empty() {
        return None;
    }
    let key = format!("{}{value}", ColorRole::Border.key_prefix());
    let value = value.to_owned();
    Some(cache.get_or_insert_generic(key, move || -> Modifier {
        Rc::new(move |theme: &Theme| {
            ModifierResult::Ready(recolor(&value, &colors, |color| {
                modify_border_color(color, theme)
            }))
        })
    }))
}

fn recolor(
    text: &str,
    colors: &[(std::ops::Range<usize>, Rgba)],
    modify: impl Fn(&Rgba) -> String,
) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for (range, color) in colors {
        result.push_str(&text[last..range.start]);
        result.push_str(&modify(color));
        last = range.end;
    }
    result.push_str(&text[last..]);
    result
}

struct ShadowLayer {
    text: String,
    color: Option<(std::ops::Range<usize>, Rgba)>,
}

/// Modifier recoloring the first color of every comma separated shadow
/// layer. `none` has no modifier.
pub fn get_shadow_modifier_with_info(value: &str, cache: &ModificationCache) -> Option<Modifier> {
    let key = format!("shadow:{value}");
    if let Some(modifier) = cache.shadow(&key) {
        return Some(modifier);
    }

    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }

    let layers: Vec<ShadowLayer> = split_top_level_commas(value)
        .into_iter()
        .map(str::trim)
        .map(|layer| ShadowLayer {
            text: layer.to_owned(),
            color: find_colors(layer).into_iter().next(),
        })
        .collect();

    let modifier: Modifier = Rc::new(move |theme: &Theme| {
        let layers: Vec<String> = layers
            .iter()
            .map(|layer| match &layer.color {
                Some((range, color)) => recolor(&layer.text, &[(range.clone(), *color)], |color| {
                    modify_shadow_color(color, theme)
                }),
                None => layer.text.clone(),
            })
            .collect();
        ModifierResult::Ready(layers.join(", "))
    });
    cache.insert_shadow(key, modifier.clone());
    Some(modifier)
}

/// Input of [`get_bg_image_modifier`]: the value itself, or a value that is
/// still being computed (e.g. a variable resolved asynchronously).
pub enum BgImageValue {
    Text(String),
    Pending(LocalBoxFuture<'static, Option<String>>),
}

/// The parts of a [`ModifierContext`] a background modifier keeps after
/// classification.
#[derive(Clone)]
struct ImageContext {
    base_url: Option<Url>,
    analyzer: Option<Rc<dyn ImageAnalyzer>>,
    is_cancelled: Option<CancellationCheck>,
}

impl ImageContext {
    fn new(context: &ModifierContext) -> Self {
        let base_url = context
            .rule
            .and_then(|rule| rule.stylesheet_href)
            .or(context.document_url)
            .cloned();
        let ignored = context.rule.is_some_and(|rule| {
            context
                .ignored_image_analysis_selectors
                .iter()
                .any(|selector| !selector.is_empty() && rule.selector_text.contains(selector.as_str()))
        });
        if ignored {
            debug!("Image analysis is disabled for this rule");
        }
        ImageContext {
            base_url,
            analyzer: if ignored { None } else { context.image_analyzer.clone() },
            is_cancelled: context.is_cancelled.clone(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.is_cancelled.as_ref().is_some_and(|check| check())
    }
}

struct CompiledGradient {
    function_name: String,
    arguments: Vec<(String, Vec<(std::ops::Range<usize>, Rgba)>)>,
}

impl CompiledGradient {
    fn apply(&self, theme: &Theme) -> String {
        let arguments: Vec<String> = self
            .arguments
            .iter()
            .map(|(text, colors)| recolor(text, colors, |color| modify_gradient_color(color, theme)))
            .collect();
        format!("{}({})", self.function_name, arguments.join(", "))
    }
}

enum BgPart {
    Text(String),
    Gradient(CompiledGradient),
    Image(Url),
}

struct BgImageParts {
    parts: Vec<BgPart>,
    /// Resolved against a base URL, so the result is only valid for this
    /// rule and must not be cached by value.
    depends_on_base: bool,
}

fn compile_gradient(text: &str) -> Option<CompiledGradient> {
    match parse_gradient(text) {
        Ok(gradient) => Some(CompiledGradient {
            function_name: gradient.function_name(),
            arguments: gradient
                .arguments
                .iter()
                .map(|argument| (argument.to_string(), find_colors(argument)))
                .collect(),
        }),
        Err(error) => {
            warn!("Failed to parse gradient {text}: {error}");
            None
        },
    }
}

impl BgImageParts {
    fn compile(value: &str, image: &ImageContext) -> Self {
        enum Segment {
            Gradient,
            Url(String),
        }

        let mut segments: Vec<(std::ops::Range<usize>, Segment)> =
            find_functions(value, is_gradient_function)
                .into_iter()
                .map(|call| (call.range, Segment::Gradient))
                .collect();
        for css_url in find_css_urls(value) {
            let overlaps = segments.iter().any(|(range, _)| {
                css_url.range.start < range.end && range.start < css_url.range.end
            });
            if !overlaps {
                segments.push((css_url.range, Segment::Url(css_url.value)));
            }
        }
        segments.sort_by_key(|(range, _)| range.start);

        let mut parts = Vec::new();
        let mut depends_on_base = false;
        let mut last = 0;
        for (range, segment) in segments {
            if range.start > last {
                parts.push(BgPart::Text(value[last..range.start].to_owned()));
            }
            let original = &value[range.clone()];
            let part = match segment {
                Segment::Gradient => compile_gradient(original).map(BgPart::Gradient),
                Segment::Url(target) if target.is_empty() || is_data_url(&target) => None,
                Segment::Url(target) => {
                    depends_on_base = true;
                    match get_absolute_url(image.base_url.as_ref(), &target) {
                        Some(url) if image.analyzer.is_some() => Some(BgPart::Image(url)),
                        Some(url) => Some(BgPart::Text(css_url(&url))),
                        None => {
                            debug!("Cannot resolve background image URL {target}");
                            None
                        },
                    }
                },
            };
            parts.push(part.unwrap_or_else(|| BgPart::Text(original.to_owned())));
            last = range.end;
        }
        if last < value.len() {
            parts.push(BgPart::Text(value[last..].to_owned()));
        }

        BgImageParts {
            parts,
            depends_on_base,
        }
    }

    fn images(&self) -> Vec<Url> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                BgPart::Image(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// `details` holds one entry per image part, in order.
    fn render(&self, theme: &Theme, details: &[Option<ImageDetails>]) -> String {
        let mut details = details.iter();
        self.parts
            .iter()
            .map(|part| match part {
                BgPart::Text(text) => text.clone(),
                BgPart::Gradient(gradient) => gradient.apply(theme),
                BgPart::Image(url) => {
                    image_replacement(url, details.next().and_then(Option::as_ref), theme)
                },
            })
            .collect()
    }

    fn into_modifier(self, image: ImageContext) -> Modifier {
        let parts = Rc::new(self);
        let images = parts.images();
        if images.is_empty() {
            return Rc::new(move |theme: &Theme| ModifierResult::Ready(parts.render(theme, &[])));
        }
        Rc::new(move |theme: &Theme| {
            let Some(analyzer) = image.analyzer.clone() else {
                return ModifierResult::Ready(parts.render(theme, &[]));
            };
            let parts = parts.clone();
            let image = image.clone();
            let theme = theme.clone();
            let analyses: Vec<_> = images.iter().map(|url| analyzer.analyze(url)).collect();
            ModifierResult::Pending(
                async move {
                    let details = join_all(analyses).await;
                    if image.is_cancelled() {
                        debug!("Dropping image analysis result of a cancelled render");
                        return None;
                    }
                    Some(parts.render(&theme, &details))
                }
                .boxed_local(),
            )
        })
    }
}

fn compile_bg_image(value: &str, image: ImageContext) -> Option<(Modifier, bool)> {
    if !has_url(value) && !has_gradient(value) {
        let color = parse_color(value)?;
        return Some((solid_color_modifier(ColorRole::Background, color), false));
    }
    let parts = BgImageParts::compile(value, &image);
    let cacheable = !parts.depends_on_base;
    Some((parts.into_modifier(image), cacheable))
}

/// Modifier for values holding gradients and images. Gradient colors are
/// recolored, image URLs made absolute and, when an analyzer is available,
/// large light images are dropped in dark mode.
pub fn get_bg_image_modifier(
    value: BgImageValue,
    context: &ModifierContext,
    cache: &ModificationCache,
) -> Option<Modifier> {
    let image = ImageContext::new(context);
    match value {
        BgImageValue::Text(value) => {
            if !has_url(&value) && !has_gradient(&value) {
                return color_modifier(ColorRole::Background, &value, cache);
            }
            let key = format!("bg:{value}");
            if let Some(modifier) = cache.gradient(&key) {
                return Some(modifier);
            }
            let (modifier, cacheable) = compile_bg_image(&value, image)?;
            if cacheable {
                cache.insert_gradient(key, modifier.clone());
            }
            Some(modifier)
        },
        BgImageValue::Pending(future) => {
            let input = future.shared();
            let modifier: Modifier = Rc::new(move |theme: &Theme| {
                let input = input.clone();
                let image = image.clone();
                let theme = theme.clone();
                ModifierResult::Pending(
                    async move {
                        let value = input.await?;
                        if image.is_cancelled() {
                            return None;
                        }
                        let (modifier, _) = compile_bg_image(&value, image)?;
                        modifier(&theme).resolve().await
                    }
                    .boxed_local(),
                )
            });
            Some(modifier)
        },
    }
}

const WHITE: Rgba = Rgba::new(255.0, 255.0, 255.0, 1.0);
const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
const CONTROL_BORDER: Rgba = Rgba::new(153.0, 153.0, 153.0, 1.0);
const RANGE_TRACK: Rgba = Rgba::new(221.0, 221.0, 221.0, 1.0);
const DEFAULT_SELECTION: Rgba = Rgba::new(0.0, 90.0, 156.0, 1.0);

/// Base style for the document itself and native form controls.
pub fn get_modified_user_agent_style(
    theme: &Theme,
    is_iframe: bool,
    style_system_controls: bool,
) -> String {
    let mut lines = vec![
        "html {".to_owned(),
        format!("    background: {} !important;", modify_background_color(&WHITE, theme)),
        "}".to_owned(),
    ];

    if is_iframe {
        lines.extend([
            String::new(),
            "html, body {".to_owned(),
            format!("    border-color: {} !important;", modify_border_color(&CONTROL_BORDER, theme)),
            "}".to_owned(),
        ]);
    }

    if style_system_controls {
        lines.extend([
            String::new(),
            "input, textarea, select, button {".to_owned(),
            format!("    background-color: {} !important;", modify_background_color(&WHITE, theme)),
            format!("    border-color: {} !important;", modify_border_color(&CONTROL_BORDER, theme)),
            format!("    color: {} !important;", modify_foreground_color(&BLACK, theme)),
            "}".to_owned(),
            String::new(),
            "input[type=\"range\"] {".to_owned(),
            format!("    background-color: {} !important;", modify_background_color(&RANGE_TRACK, theme)),
            "}".to_owned(),
        ]);
    }

    lines.join("\n")
}

/// Style applied while the page's own stylesheets are still loading.
pub fn get_modified_fallback_style(theme: &Theme, strict: bool) -> String {
    let background = modify_background_color(&WHITE, theme);
    let text = modify_foreground_color(&BLACK, theme);
    let border = modify_border_color(&CONTROL_BORDER, theme);

    let mut lines = if strict {
        vec![
            "html, body {".to_owned(),
            format!("    background: {background} !important;"),
            format!("    color: {text} !important;"),
            "}".to_owned(),
        ]
    } else {
        vec![
            "html {".to_owned(),
            format!("    background: {background} !important;"),
            "}".to_owned(),
            String::new(),
            "body {".to_owned(),
            format!("    color: {text} !important;"),
            "}".to_owned(),
        ]
    };
    lines.extend([
        String::new(),
        "input, textarea, select, button {".to_owned(),
        format!("    background: {background} !important;"),
        format!("    color: {text} !important;"),
        format!("    border-color: {border} !important;"),
        "}".to_owned(),
    ]);
    lines.join("\n")
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectionColors {
    pub background: String,
    pub foreground: String,
}

pub fn get_selection_color(theme: &Theme) -> SelectionColors {
    let selection = theme.selection_color.trim();
    let background = if selection.is_empty() || selection.eq_ignore_ascii_case("auto") {
        DEFAULT_SELECTION
    } else {
        parse_color(selection).unwrap_or_else(|| {
            warn!("Invalid selection color {selection}, using the default");
            DEFAULT_SELECTION
        })
    };
    SelectionColors {
        background: modify_background_color(&background, theme),
        foreground: modify_foreground_color(&WHITE, theme),
    }
}

pub fn get_selection_style(theme: &Theme) -> String {
    let SelectionColors {
        background,
        foreground,
    } = get_selection_color(theme);
    ["::selection", "::-moz-selection"]
        .iter()
        .map(|selector| {
            format!(
                "{selector} {{\n    background-color: {background} !important;\n    color: {foreground} !important;\n}}"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Absolute URLs of the images referenced by an element's inline `style`
/// attribute. Data URLs are skipped.
pub fn collect_inline_image_urls(style_text: &str, base: Option<&Url>) -> Vec<Url> {
    let urls: Vec<Url> = parse_declaration_block(style_text)
        .iter()
        .filter(|declaration| DeclarationKind::Image.accepts_property(&declaration.property))
        .flat_map(|declaration| find_css_urls(&declaration.value))
        .filter(|css_url| !css_url.value.is_empty() && !is_data_url(&css_url.value))
        .filter_map(|css_url| get_absolute_url(base, &css_url.value))
        .collect();
    if !urls.is_empty() {
        info!("Found {} inline background images", urls.len());
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_starts_with_variables() {
        assert_eq!(DeclarationKind::PRIORITY[0], DeclarationKind::VarDependant);
        assert_eq!(DeclarationKind::PRIORITY[6], DeclarationKind::Image);
    }

    #[test]
    fn recolor_splices_in_order() {
        let text = "1px solid red";
        let colors = find_colors(text);
        assert_eq!(recolor(text, &colors, |_| "X".to_owned()), "1px solid X");
    }

    #[test]
    fn selection_falls_back_to_default() {
        let theme = Theme {
            selection_color: "not a color".to_owned(),
            ..Theme::default()
        };
        assert_eq!(
            get_selection_color(&theme),
            get_selection_color(&Theme::default())
        );
    }

    #[test]
    fn user_agent_style_sections() {
        let theme = Theme::default();
        let minimal = get_modified_user_agent_style(&theme, false, false);
        assert!(minimal.starts_with("html {\n    background: rgb(24, 26, 27) !important;"));
        assert!(!minimal.contains("input"));
        let full = get_modified_user_agent_style(&theme, true, true);
        assert!(full.contains("html, body {"));
        assert!(full.contains("input[type=\"range\"] {"));
    }
}
