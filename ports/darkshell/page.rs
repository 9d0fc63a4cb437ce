/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Themes one page: collects its stylesheets, runs a style manager per
//! sheet and assembles the injected stylesheet.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use dark_theme::meta_theme_color::META_THEME_COLOR_NAME;
use dark_theme::modify_css::{
    collect_inline_image_urls, get_modified_fallback_style, get_modified_user_agent_style,
    get_selection_style,
};
use dark_theme::style_manager::get_manageable_styles;
use dark_theme::{
    MetaThemeColor, ModificationCache, RenderEnvironment, StyleElement, StyleManager,
    StyleManagerCallbacks, Theme, ThemeMode, VariablesStore, manage_style,
};
use futures::future::join_all;
use log::{debug, info, warn};
use site_fixes::{
    DynamicThemeFix, get_dynamic_theme_fixes_for, index_site_list_config,
    index_sites_fixes_config, is_url_in_site_list,
};

use crate::analyzer::FileImageAnalyzer;
use crate::fetch::FileFetcher;
use crate::prefs::{DarkshellPrefs, PrefsError, read_file};

const INVERT_FILTER: &str = "invert(100%) hue-rotate(180deg) contrast(90%)";

/// An inline `style` attribute and the selector of its element.
#[derive(Clone, Debug, PartialEq)]
struct InlineStyle {
    selector: String,
    style: String,
}

/// One `selector<TAB>style` per line. Blank lines and lines without a tab
/// are skipped.
fn parse_inline_styles(text: &str) -> Vec<InlineStyle> {
    text.lines()
        .filter_map(|line| {
            let (selector, style) = line.split_once('\t')?;
            let (selector, style) = (selector.trim(), style.trim());
            if selector.is_empty() || style.is_empty() {
                return None;
            }
            Some(InlineStyle {
                selector: selector.to_owned(),
                style: style.to_owned(),
            })
        })
        .collect()
}

fn is_inline_style_ignored(style: &InlineStyle, ignored: &[String]) -> bool {
    ignored.iter().any(|selector| selector.trim() == style.selector)
}

fn invert_style(selectors: &[String], theme: &Theme) -> Option<String> {
    if selectors.is_empty() || theme.mode != ThemeMode::Dark {
        return None;
    }
    Some(format!(
        "{} {{\n    filter: {INVERT_FILTER} !important;\n}}",
        selectors.join(", ")
    ))
}

fn load_fixes(prefs: &DarkshellPrefs, url: &str) -> Result<DynamicThemeFix, PrefsError> {
    let Some(path) = &prefs.fixes_path else {
        return Ok(DynamicThemeFix::default());
    };
    let index = index_sites_fixes_config::<DynamicThemeFix>(&read_file(path)?)?;
    let fix = get_dynamic_theme_fixes_for(url, &index).unwrap_or_default();
    debug!("Fixes for {url}: {fix:?}");
    Ok(fix)
}

fn collect_elements(
    prefs: &DarkshellPrefs,
    fix: &DynamicThemeFix,
) -> Result<Vec<StyleElement>, PrefsError> {
    let mut elements = Vec::new();
    for path in &prefs.stylesheets {
        elements.push(StyleElement::style(&read_file(path)?));
    }
    elements.extend(prefs.links.iter().map(|url| StyleElement::link(url.clone(), None)));

    if let Some(path) = &prefs.inline_styles_path {
        for inline in parse_inline_styles(&read_file(path)?) {
            if is_inline_style_ignored(&inline, &fix.ignore_inline_style) {
                debug!("Leaving inline style of {} alone", inline.selector);
                continue;
            }
            for url in collect_inline_image_urls(&inline.style, prefs.page_url.as_ref()) {
                debug!("{} uses image {url}", inline.selector);
            }
            elements.push(StyleElement::style(&format!(
                "{} {{ {} }}",
                inline.selector, inline.style
            )));
        }
    }
    Ok(elements)
}

/// Custom properties are shared between all sheets of a document,
/// including the ones only readable through an out of band copy.
fn document_variables(managers: &[StyleManager]) -> VariablesStore {
    let mut variables = VariablesStore::new();
    for rules in managers.iter().filter_map(|manager| manager.details(true)) {
        variables.add_rules(rules);
    }
    variables
}

/// The page's `<meta name="theme-color">` as it should read under `theme`,
/// emitted as a comment for the host to apply.
fn meta_theme_color_section(
    content: &str,
    theme: &Theme,
    cache: &ModificationCache,
) -> Option<String> {
    let modified = MetaThemeColor::new().change(content, theme, cache)?;
    info!("theme-color {content} becomes {modified}");
    Some(format!(
        "/* <meta name=\"{META_THEME_COLOR_NAME}\" content=\"{modified}\"> */"
    ))
}

fn logging_callbacks(element: &StyleElement) -> StyleManagerCallbacks {
    let href = element.href.as_ref().map(|href| href.to_string());
    let end_href = href.clone();
    StyleManagerCallbacks {
        update: None,
        loading_start: Some(Box::new(move || debug!("Loading {href:?}"))),
        loading_end: Some(Box::new(move || debug!("Loaded {end_href:?}"))),
    }
}

/// Sheets whose rules cannot be read get their text fetched out of band.
async fn load_unreadable_sheet(manager: &mut StyleManager, fetcher: &FileFetcher) {
    if manager.details(false).is_some() {
        return;
    }
    if let Err(error) = manager.load_cors_copy(fetcher).await {
        warn!("Skipping {:?}: {error}", manager.element().href);
    }
}

async fn render_sheet(
    mut manager: StyleManager,
    theme: &Theme,
    ignore_image_analysis: &[String],
) -> Option<String> {
    match manager.render(theme, ignore_image_analysis) {
        Ok(Some(pending)) => {
            let resolved = pending.resolve().await;
            manager.commit(resolved);
        },
        Ok(None) => {},
        Err(error) => warn!("Cannot render {:?}: {error}", manager.element().href),
    }
    let css = manager.override_css().map(str::to_owned);
    manager.destroy();
    css.filter(|css| !css.is_empty())
}

fn write_output(path: Option<&Path>, css: &str) -> Result<(), PrefsError> {
    match path {
        Some(path) => fs::write(path, css).map_err(|error| PrefsError::Io {
            path: path.to_owned(),
            error,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{css}").map_err(|error| PrefsError::Io {
                path: "<stdout>".into(),
                error,
            })
        },
    }
}

pub(crate) async fn run(prefs: &DarkshellPrefs) -> Result<(), PrefsError> {
    let url = prefs.page_url.as_ref().map(|url| url.to_string()).unwrap_or_default();

    if let (Some(path), false) = (&prefs.dark_sites_path, url.is_empty()) {
        let dark_sites = index_site_list_config(&read_file(path)?);
        if is_url_in_site_list(&url, Some(&dark_sites)) {
            info!("{url} is dark already, nothing to do");
            return Ok(());
        }
    }

    let theme = &prefs.theme;
    let fix = load_fixes(prefs, &url)?;
    let cache = Rc::new(ModificationCache::new());

    let mut sections = Vec::new();
    if prefs.fallback {
        sections.push(get_modified_fallback_style(theme, prefs.strict));
    }
    sections.push(get_modified_user_agent_style(
        theme,
        prefs.is_iframe,
        theme.style_system_controls,
    ));
    sections.push(get_selection_style(theme));
    if !fix.css.is_empty() {
        sections.push(fix.css.clone());
    }
    sections.extend(invert_style(&fix.invert, theme));

    let elements = collect_elements(prefs, &fix)?;
    let environment = RenderEnvironment {
        document_url: prefs.page_url.clone(),
        cache: cache.clone(),
        variables: None,
        image_analyzer: Some(Rc::new(FileImageAnalyzer::default())),
    };
    let mut managers: Vec<StyleManager> = get_manageable_styles(&elements)
        .into_iter()
        .map(|element| {
            manage_style(element.clone(), environment.clone(), logging_callbacks(element))
        })
        .collect();
    info!("Theming {} of {} stylesheets", managers.len(), elements.len());

    let fetcher = FileFetcher;
    join_all(
        managers
            .iter_mut()
            .map(|manager| load_unreadable_sheet(manager, &fetcher)),
    )
    .await;
    let variables = Rc::new(document_variables(&managers));
    debug!("{} custom properties in the document", variables.len());
    for manager in &mut managers {
        manager.set_variables(Some(variables.clone()));
    }

    let overrides = join_all(
        managers
            .into_iter()
            .map(|manager| render_sheet(manager, theme, &fix.ignore_image_analysis)),
    )
    .await;
    sections.extend(overrides.into_iter().flatten());

    if let Some(content) = &prefs.meta_theme_color {
        sections.extend(meta_theme_color_section(content, theme, &cache));
    }
    debug!(
        "Cache holds {} generic, {} shadow and {} gradient modifiers",
        cache.generic_len(),
        cache.shadow_len(),
        cache.gradient_len()
    );

    write_output(prefs.output.as_deref(), &sections.join("\n\n"))
}
