/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Lifecycle of one managed `<style>` or `<link rel=stylesheet>` element.
//!
//! ```text
//! Unwatched -> Watching <-> Rendering
//!      \           |            /
//!       +------> Paused <------+      (any state) -> Destroyed
//! ```
//!
//! A render recolors every declaration of the element's rules and writes the
//! result to an override stylesheet. Values that need image analysis are
//! returned as a [`PendingRender`]; the host awaits it and hands the result
//! back to [`StyleManager::commit`], which discards it if anything newer
//! happened in between.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use futures::future::{LocalBoxFuture, join_all};
use log::{debug, info, warn};
use url::Url;

use crate::cache::ModificationCache;
use crate::css_rules::{CssRule, parse_stylesheet};
use crate::css_text::replace_css_relative_urls_with_absolute;
use crate::image::{CancellationCheck, ImageAnalyzer};
use crate::modify_css::{
    ModifierContext, ModifierResult, RuleContext, get_modifiable_css_declaration,
};
use crate::theme::Theme;
use crate::variables::VariablesStore;

/// Class carried by the styles this engine injects itself.
pub const INJECTED_STYLE_CLASS: &str = "darkshell";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StyleElementKind {
    Style,
    Link,
}

/// The parts of a style element the manager looks at.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleElement {
    pub kind: StyleElementKind,
    pub href: Option<Url>,
    pub rel: String,
    pub media: String,
    pub disabled: bool,
    pub class_list: Vec<String>,
    /// The text of a `<style>`, or of a loaded `<link>` sheet whose rules are
    /// readable. `None` for cross-origin or not yet loaded sheets.
    pub css_text: Option<String>,
}

impl StyleElement {
    pub fn style(css_text: &str) -> Self {
        StyleElement {
            kind: StyleElementKind::Style,
            href: None,
            rel: String::new(),
            media: String::new(),
            disabled: false,
            class_list: Vec::new(),
            css_text: Some(css_text.to_owned()),
        }
    }

    pub fn link(href: Url, css_text: Option<String>) -> Self {
        StyleElement {
            kind: StyleElementKind::Link,
            href: Some(href),
            rel: "stylesheet".to_owned(),
            media: String::new(),
            disabled: false,
            class_list: Vec::new(),
            css_text,
        }
    }
}

fn is_print_only(media: &str) -> bool {
    let media = media.trim();
    !media.is_empty() &&
        media
            .split(',')
            .all(|medium| medium.trim().eq_ignore_ascii_case("print"))
}

pub fn should_manage_style(element: &StyleElement) -> bool {
    if element.disabled ||
        element.class_list.iter().any(|class| class == INJECTED_STYLE_CLASS) ||
        is_print_only(&element.media)
    {
        return false;
    }
    match element.kind {
        StyleElementKind::Style => true,
        StyleElementKind::Link => {
            let rel = element.rel.to_ascii_lowercase();
            let mut rel = rel.split_ascii_whitespace();
            let is_stylesheet = rel.clone().any(|token| token == "stylesheet");
            let is_alternate = rel.any(|token| token == "alternate");
            let Some(href) = &element.href else {
                return false;
            };
            // Font CSS only declares @font-face rules.
            let is_font_css = href.host_str() == Some("fonts.googleapis.com");
            is_stylesheet && !is_alternate && !is_font_css
        },
    }
}

pub fn get_manageable_styles(elements: &[StyleElement]) -> Vec<&StyleElement> {
    elements
        .iter()
        .filter(|element| should_manage_style(element))
        .collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StyleManagerState {
    Unwatched,
    Watching,
    /// Waiting for a [`PendingRender`] to be committed.
    Rendering,
    Paused,
    Destroyed,
}

/// Collaborators shared by every manager of a theming session.
#[derive(Clone, Default)]
pub struct RenderEnvironment {
    pub document_url: Option<Url>,
    pub cache: Rc<ModificationCache>,
    /// Document-wide custom properties. Without it each sheet only sees its
    /// own definitions.
    pub variables: Option<Rc<VariablesStore>>,
    pub image_analyzer: Option<Rc<dyn ImageAnalyzer>>,
}

pub type Callback = Box<dyn FnMut()>;

#[derive(Default)]
pub struct StyleManagerCallbacks {
    /// The override stylesheet changed outside of an explicit render call.
    pub update: Option<Callback>,
    pub loading_start: Option<Callback>,
    pub loading_end: Option<Callback>,
}

fn fire(callback: &mut Option<Callback>) {
    if let Some(callback) = callback {
        callback();
    }
}

/// Changes observed on the managed element.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleMutation {
    TextChanged(String),
    /// A `<link>` finished loading. `None` when its rules are not readable.
    SheetLoaded(Option<String>),
    RuleInserted { index: usize, css_text: String },
    RuleDeleted { index: usize },
    HrefChanged(Option<Url>),
    MediaChanged(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FetchError {
    NotFound(Url),
    Failed { url: Url, reason: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(url) => write!(f, "{url} not found"),
            FetchError::Failed { url, reason } => write!(f, "failed to fetch {url}: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Out-of-band access to stylesheet text, used when a sheet's rules cannot
/// be read directly.
pub trait CssFetcher {
    fn fetch_css<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, FetchError>>;
}

#[derive(Debug)]
pub enum StyleManagerError {
    Destroyed,
    MissingHref,
    Fetch(FetchError),
}

impl fmt::Display for StyleManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleManagerError::Destroyed => write!(f, "style manager was destroyed"),
            StyleManagerError::MissingHref => write!(f, "stylesheet has no href"),
            StyleManagerError::Fetch(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for StyleManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StyleManagerError::Fetch(error) => Some(error),
            _ => None,
        }
    }
}

impl From<FetchError> for StyleManagerError {
    fn from(error: FetchError) -> Self {
        StyleManagerError::Fetch(error)
    }
}

enum OutputValue {
    Ready(String),
    /// Index into the pending futures of the render.
    Pending(usize),
}

struct OutputDeclaration {
    property: String,
    value: OutputValue,
    important: bool,
}

enum OutputRule {
    Style {
        selector_text: String,
        declarations: Vec<OutputDeclaration>,
    },
    Group {
        prelude: String,
        rules: Vec<OutputRule>,
    },
}

fn build_output(
    rules: &[CssRule],
    context: &ModifierContext,
    href: Option<&Url>,
    cache: &ModificationCache,
    theme: &Theme,
    pending: &mut Vec<LocalBoxFuture<'static, Option<String>>>,
) -> Vec<OutputRule> {
    let mut output = Vec::new();
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                let context = ModifierContext {
                    rule: Some(RuleContext {
                        selector_text: &style.selector_text,
                        stylesheet_href: href,
                    }),
                    ..context.clone()
                };
                let declarations = style
                    .declarations
                    .iter()
                    .filter_map(|declaration| {
                        get_modifiable_css_declaration(
                            &declaration.property,
                            &declaration.value,
                            declaration.important,
                            &context,
                            cache,
                        )
                    })
                    .map(|declaration| {
                        let value = match (declaration.modifier)(theme) {
                            ModifierResult::Ready(value) => OutputValue::Ready(value),
                            ModifierResult::Pending(future) => {
                                pending.push(future);
                                OutputValue::Pending(pending.len() - 1)
                            },
                        };
                        OutputDeclaration {
                            property: declaration.property,
                            value,
                            important: declaration.important,
                        }
                    })
                    .collect();
                output.push(OutputRule::Style {
                    selector_text: style.selector_text.clone(),
                    declarations,
                });
            },
            CssRule::Group { prelude, rules } => output.push(OutputRule::Group {
                prelude: prelude.clone(),
                rules: build_output(rules, context, href, cache, theme, pending),
            }),
            CssRule::Other { .. } => {},
        }
    }
    output
}

/// Serialize the rules that have at least one value. `resolved` holds the
/// pending values by index, missing ones are left out.
fn serialize(rules: &[OutputRule], resolved: &[Option<String>]) -> Vec<String> {
    let mut blocks = Vec::new();
    for rule in rules {
        match rule {
            OutputRule::Style {
                selector_text,
                declarations,
            } => {
                let lines: Vec<String> = declarations
                    .iter()
                    .filter_map(|declaration| {
                        let value = match &declaration.value {
                            OutputValue::Ready(value) => value.as_str(),
                            OutputValue::Pending(index) => resolved.get(*index)?.as_deref()?,
                        };
                        let important = if declaration.important { " !important" } else { "" };
                        Some(format!("    {}: {value}{important};", declaration.property))
                    })
                    .collect();
                if !lines.is_empty() {
                    blocks.push(format!("{selector_text} {{\n{}\n}}", lines.join("\n")));
                }
            },
            OutputRule::Group { prelude, rules } => {
                let inner = serialize(rules, resolved);
                if !inner.is_empty() {
                    blocks.push(format!("{prelude} {{\n{}\n}}", inner.join("\n")));
                }
            },
        }
    }
    blocks
}

/// The part of a render that waits for image analysis.
pub struct PendingRender {
    generation: u64,
    current_generation: Rc<Cell<u64>>,
    rules: Vec<OutputRule>,
    values: Vec<LocalBoxFuture<'static, Option<String>>>,
}

impl PendingRender {
    /// `false` once the manager rendered again, paused or was destroyed.
    pub fn is_current(&self) -> bool {
        self.current_generation.get() == self.generation
    }

    pub fn pending_count(&self) -> usize {
        self.values.len()
    }

    pub async fn resolve(self) -> ResolvedRender {
        let resolved = join_all(self.values).await;
        ResolvedRender {
            generation: self.generation,
            css: serialize(&self.rules, &resolved).join("\n"),
        }
    }
}

impl fmt::Debug for PendingRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRender")
            .field("generation", &self.generation)
            .field("pending", &self.values.len())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRender {
    generation: u64,
    css: String,
}

impl ResolvedRender {
    pub fn css(&self) -> &str {
        &self.css
    }
}

pub struct StyleManager {
    element: StyleElement,
    state: StyleManagerState,
    environment: RenderEnvironment,
    callbacks: StyleManagerCallbacks,
    rules: Option<Vec<CssRule>>,
    cors_copy: Option<Vec<CssRule>>,
    override_css: Option<String>,
    last_render: Option<(Theme, Vec<String>)>,
    generation: Rc<Cell<u64>>,
    pending_generation: Option<u64>,
}

impl fmt::Debug for StyleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleManager")
            .field("href", &self.element.href)
            .field("state", &self.state())
            .field("cors_copy", &self.cors_copy.is_some())
            .finish_non_exhaustive()
    }
}

pub fn manage_style(
    element: StyleElement,
    environment: RenderEnvironment,
    callbacks: StyleManagerCallbacks,
) -> StyleManager {
    let rules = element.css_text.as_deref().map(parse_stylesheet);
    if rules.is_none() {
        debug!("Rules of {:?} are not accessible", element.href);
    }
    StyleManager {
        element,
        state: StyleManagerState::Unwatched,
        environment,
        callbacks,
        rules,
        cors_copy: None,
        override_css: None,
        last_render: None,
        generation: Rc::new(Cell::new(0)),
        pending_generation: None,
    }
}

impl StyleManager {
    pub fn state(&self) -> StyleManagerState {
        match self.state {
            StyleManagerState::Unwatched | StyleManagerState::Watching
                if self.pending_generation.is_some() =>
            {
                StyleManagerState::Rendering
            },
            state => state,
        }
    }

    pub fn element(&self) -> &StyleElement {
        &self.element
    }

    /// The generated override stylesheet, if any.
    pub fn override_css(&self) -> Option<&str> {
        self.override_css.as_deref()
    }

    pub fn has_cors_copy(&self) -> bool {
        self.cors_copy.is_some()
    }

    /// Share custom properties collected from every sheet of the document.
    /// `None` makes renders fall back to the element's own definitions.
    pub fn set_variables(&mut self, variables: Option<Rc<VariablesStore>>) {
        self.environment.variables = variables;
    }

    /// The rules of the element, or `None` if they cannot be read. The
    /// second round falls back to the copy installed by
    /// [`StyleManager::load_cors_copy`].
    pub fn details(&self, second_round: bool) -> Option<&[CssRule]> {
        if self.state == StyleManagerState::Destroyed {
            return None;
        }
        match (&self.rules, &self.cors_copy) {
            (Some(rules), _) => Some(rules.as_slice()),
            (None, Some(copy)) if second_round => Some(copy.as_slice()),
            _ => None,
        }
    }

    /// Invalidate outstanding asynchronous work.
    fn next_generation(&mut self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.pending_generation = None;
        generation
    }

    pub fn render(
        &mut self,
        theme: &Theme,
        ignore_image_analysis: &[String],
    ) -> Result<Option<PendingRender>, StyleManagerError> {
        match self.state {
            StyleManagerState::Destroyed => return Err(StyleManagerError::Destroyed),
            StyleManagerState::Paused => {
                debug!("Not rendering paused stylesheet {:?}", self.element.href);
                self.last_render = Some((theme.clone(), ignore_image_analysis.to_vec()));
                return Ok(None);
            },
            _ => {},
        }

        let generation = self.next_generation();
        self.last_render = Some((theme.clone(), ignore_image_analysis.to_vec()));

        let Some(rules) = self.details(true) else {
            debug!("Nothing to render for {:?}", self.element.href);
            self.override_css = None;
            return Ok(None);
        };

        let local_variables;
        let variables = match &self.environment.variables {
            Some(variables) => &**variables,
            None => {
                local_variables = VariablesStore::from_rules(rules);
                &local_variables
            },
        };
        let current = self.generation.clone();
        let is_cancelled: CancellationCheck = Rc::new(move || current.get() != generation);
        let context = ModifierContext {
            rule: None,
            document_url: self.environment.document_url.as_ref(),
            variables: Some(variables),
            ignored_image_analysis_selectors: ignore_image_analysis,
            is_cancelled: Some(is_cancelled),
            image_analyzer: self.environment.image_analyzer.clone(),
        };

        let mut values = Vec::new();
        let output = build_output(
            rules,
            &context,
            self.element.href.as_ref(),
            &self.environment.cache,
            theme,
            &mut values,
        );
        let css = serialize(&output, &[]).join("\n");
        self.override_css = Some(css);

        if values.is_empty() {
            return Ok(None);
        }
        debug!("{} values of {:?} wait for image analysis", values.len(), self.element.href);
        self.pending_generation = Some(generation);
        Ok(Some(PendingRender {
            generation,
            current_generation: self.generation.clone(),
            rules: output,
            values,
        }))
    }

    /// Install the result of a pending render. Returns `false` when the
    /// result is stale.
    pub fn commit(&mut self, resolved: ResolvedRender) -> bool {
        if self.pending_generation != Some(resolved.generation) ||
            self.generation.get() != resolved.generation
        {
            debug!("Discarding stale render of {:?}", self.element.href);
            return false;
        }
        self.pending_generation = None;
        self.override_css = Some(resolved.css);
        fire(&mut self.callbacks.update);
        true
    }

    /// Start observing mutations. Resuming a paused manager re-renders with
    /// the last theme.
    pub fn watch(&mut self) -> Result<Option<PendingRender>, StyleManagerError> {
        match self.state {
            StyleManagerState::Destroyed => Err(StyleManagerError::Destroyed),
            StyleManagerState::Paused => {
                self.state = StyleManagerState::Watching;
                self.rerender()
            },
            _ => {
                self.state = StyleManagerState::Watching;
                Ok(None)
            },
        }
    }

    fn rerender(&mut self) -> Result<Option<PendingRender>, StyleManagerError> {
        let Some((theme, ignore)) = self.last_render.take() else {
            return Ok(None);
        };
        let pending = self.render(&theme, &ignore)?;
        fire(&mut self.callbacks.update);
        Ok(pending)
    }

    fn apply_mutation(&mut self, mutation: StyleMutation) {
        match mutation {
            StyleMutation::TextChanged(text) => {
                self.rules = Some(parse_stylesheet(&text));
                self.element.css_text = Some(text);
            },
            StyleMutation::SheetLoaded(text) => {
                self.rules = text.as_deref().map(parse_stylesheet);
                self.element.css_text = text;
            },
            StyleMutation::RuleInserted { index, css_text } => match &mut self.rules {
                Some(rules) => {
                    let index = index.min(rules.len());
                    for (offset, rule) in parse_stylesheet(&css_text).into_iter().enumerate() {
                        rules.insert(index + offset, rule);
                    }
                },
                None => debug!("Ignoring rule insertion into an unreadable sheet"),
            },
            StyleMutation::RuleDeleted { index } => {
                if let Some(rules) = &mut self.rules {
                    if index < rules.len() {
                        rules.remove(index);
                    }
                }
            },
            StyleMutation::HrefChanged(href) => {
                self.element.href = href;
                self.element.css_text = None;
                self.rules = None;
                self.cors_copy = None;
            },
            StyleMutation::MediaChanged(media) => self.element.media = media,
        }
    }

    /// Apply a batch of observed mutations, then re-render once if watching.
    pub fn notify_mutations(
        &mut self,
        mutations: Vec<StyleMutation>,
    ) -> Result<Option<PendingRender>, StyleManagerError> {
        if self.state == StyleManagerState::Destroyed {
            return Err(StyleManagerError::Destroyed);
        }
        if mutations.is_empty() {
            return Ok(None);
        }
        debug!("{} mutations of {:?}", mutations.len(), self.element.href);
        for mutation in mutations {
            self.apply_mutation(mutation);
        }
        if self.state != StyleManagerState::Watching {
            return Ok(None);
        }
        self.rerender()
    }

    /// Stop observing and rendering. The override stays in place.
    pub fn pause(&mut self) {
        if self.state == StyleManagerState::Destroyed {
            return;
        }
        self.next_generation();
        self.state = StyleManagerState::Paused;
    }

    /// Pause and remove everything injected for this element.
    pub fn restore(&mut self) {
        if self.state == StyleManagerState::Destroyed {
            return;
        }
        self.pause();
        self.override_css = None;
        self.cors_copy = None;
    }

    pub fn destroy(&mut self) {
        if self.state == StyleManagerState::Destroyed {
            return;
        }
        self.restore();
        self.rules = None;
        self.last_render = None;
        self.callbacks = StyleManagerCallbacks::default();
        self.state = StyleManagerState::Destroyed;
    }

    /// Fetch the sheet text out of band and install it as a readable copy.
    /// Returns `true` if a copy was installed by this call.
    pub async fn load_cors_copy(
        &mut self,
        fetcher: &dyn CssFetcher,
    ) -> Result<bool, StyleManagerError> {
        if self.state == StyleManagerState::Destroyed {
            return Err(StyleManagerError::Destroyed);
        }
        if self.rules.is_some() || self.cors_copy.is_some() {
            return Ok(false);
        }
        let href = self
            .element
            .href
            .clone()
            .ok_or(StyleManagerError::MissingHref)?;

        fire(&mut self.callbacks.loading_start);
        let result = fetcher.fetch_css(&href).await;
        fire(&mut self.callbacks.loading_end);

        let text = result.inspect_err(|error| warn!("CORS copy failed: {error}"))?;
        if self.state == StyleManagerState::Destroyed {
            return Err(StyleManagerError::Destroyed);
        }
        let text = replace_css_relative_urls_with_absolute(&text, &href);
        let rules = parse_stylesheet(&text);
        info!("Loaded CORS copy of {href} with {} rules", rules.len());
        self.cors_copy = Some(rules);
        Ok(true)
    }
}
