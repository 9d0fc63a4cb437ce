/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::Cell;
use std::rc::Rc;

use dark_theme::style_manager::{INJECTED_STYLE_CLASS, get_manageable_styles, should_manage_style};
use dark_theme::{
    CssFetcher, FetchError, ImageAnalyzer, ImageDetails, RenderEnvironment, StyleElement,
    StyleManager, StyleManagerCallbacks, StyleManagerError, StyleManagerState, StyleMutation,
    Theme, VariablesStore, manage_style,
};
use futures::FutureExt;
use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use url::Url;

const BODY_CSS: &str = "body { background-color: white; color: black } p { margin: 0 }";
const BODY_OVERRIDE: &str =
    "body {\n    background-color: rgb(24, 26, 27);\n    color: rgb(232, 230, 227);\n}";

struct LightImages;

impl ImageAnalyzer for LightImages {
    fn analyze(&self, _url: &Url) -> LocalBoxFuture<'static, Option<ImageDetails>> {
        async {
            Some(ImageDetails {
                is_light: true,
                is_large: true,
                ..ImageDetails::default()
            })
        }
        .boxed_local()
    }
}

struct FakeFetcher {
    response: Result<String, FetchError>,
}

impl CssFetcher for FakeFetcher {
    fn fetch_css<'a>(&'a self, _url: &'a Url) -> LocalBoxFuture<'a, Result<String, FetchError>> {
        let response = self.response.clone();
        async move { response }.boxed_local()
    }
}

fn counter() -> (Rc<Cell<usize>>, Box<dyn FnMut()>) {
    let count = Rc::new(Cell::new(0));
    let handle = count.clone();
    (count, Box::new(move || handle.set(handle.get() + 1)))
}

fn manager(css: &str) -> StyleManager {
    manage_style(
        StyleElement::style(css),
        RenderEnvironment::default(),
        StyleManagerCallbacks::default(),
    )
}

fn sheet_url() -> Url {
    Url::parse("https://cdn.example.net/css/site.css").unwrap()
}

#[test]
fn manageable_styles() {
    let mut injected = StyleElement::style("a {}");
    injected.class_list.push(INJECTED_STYLE_CLASS.to_owned());
    let mut print = StyleElement::style("a {}");
    print.media = "print".to_owned();
    let mut alternate = StyleElement::link(sheet_url(), None);
    alternate.rel = "alternate stylesheet".to_owned();
    let fonts = StyleElement::link(
        Url::parse("https://fonts.googleapis.com/css?family=Roboto").unwrap(),
        None,
    );
    let mut icon = StyleElement::link(sheet_url(), None);
    icon.rel = "icon".to_owned();
    let mut screen = StyleElement::style("a {}");
    screen.media = "screen, print".to_owned();
    let link = StyleElement::link(sheet_url(), None);

    assert!(!should_manage_style(&injected));
    assert!(!should_manage_style(&print));
    assert!(!should_manage_style(&alternate));
    assert!(!should_manage_style(&fonts));
    assert!(!should_manage_style(&icon));
    assert!(should_manage_style(&screen));
    assert!(should_manage_style(&link));

    let elements = [injected, screen.clone(), print, link.clone()];
    assert_eq!(get_manageable_styles(&elements), [&screen, &link]);
}

#[test]
fn render_is_idempotent() {
    let mut manager = manager(BODY_CSS);
    let theme = Theme::default();
    assert!(manager.render(&theme, &[]).unwrap().is_none());
    let first = manager.override_css().unwrap().to_owned();
    assert_eq!(first, BODY_OVERRIDE);
    assert!(manager.render(&theme, &[]).unwrap().is_none());
    assert_eq!(manager.override_css().unwrap(), first);
}

#[test]
fn render_keeps_groups_and_importance() {
    let mut manager = manager(
        "@media screen { a { color: black !important } }\n\
         @font-face { font-family: x; color: black }\n\
         :root { --bg: white }\n\
         div { background-color: var(--bg) }",
    );
    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(
        manager.override_css().unwrap(),
        "@media screen {\na {\n    color: rgb(232, 230, 227) !important;\n}\n}\n\
         div {\n    background-color: rgb(24, 26, 27);\n}"
    );
}

#[test]
fn lifecycle() {
    let mut manager = manager(BODY_CSS);
    assert_eq!(manager.state(), StyleManagerState::Unwatched);
    assert!(manager.watch().unwrap().is_none());
    assert_eq!(manager.state(), StyleManagerState::Watching);

    manager.render(&Theme::default(), &[]).unwrap();
    manager.pause();
    assert_eq!(manager.state(), StyleManagerState::Paused);
    assert_eq!(manager.override_css(), Some(BODY_OVERRIDE));

    manager.restore();
    assert_eq!(manager.state(), StyleManagerState::Paused);
    assert_eq!(manager.override_css(), None);
    assert!(manager.render(&Theme::default(), &[]).unwrap().is_none());
    assert_eq!(manager.override_css(), None);

    assert!(manager.watch().unwrap().is_none());
    assert_eq!(manager.state(), StyleManagerState::Watching);
    assert_eq!(manager.override_css(), Some(BODY_OVERRIDE));

    manager.destroy();
    manager.destroy();
    assert_eq!(manager.state(), StyleManagerState::Destroyed);
    assert!(manager.details(true).is_none());
    assert!(matches!(
        manager.render(&Theme::default(), &[]),
        Err(StyleManagerError::Destroyed)
    ));
    assert!(matches!(manager.watch(), Err(StyleManagerError::Destroyed)));
}

#[test]
fn mutation_batch_renders_once() {
    let (updates, update) = counter();
    let mut manager = manage_style(
        StyleElement::style(BODY_CSS),
        RenderEnvironment::default(),
        StyleManagerCallbacks {
            update: Some(update),
            ..StyleManagerCallbacks::default()
        },
    );
    manager.render(&Theme::default(), &[]).unwrap();

    manager
        .notify_mutations(vec![StyleMutation::TextChanged("a { color: black }".to_owned())])
        .unwrap();
    assert_eq!(updates.get(), 0, "not watching yet");
    assert_eq!(manager.override_css(), Some(BODY_OVERRIDE));

    manager.watch().unwrap();
    manager
        .notify_mutations(vec![
            StyleMutation::RuleInserted {
                index: 1,
                css_text: "b { background-color: white }".to_owned(),
            },
            StyleMutation::RuleDeleted { index: 0 },
            StyleMutation::MediaChanged("screen".to_owned()),
        ])
        .unwrap();
    assert_eq!(updates.get(), 1);
    assert_eq!(
        manager.override_css(),
        Some("b {\n    background-color: rgb(24, 26, 27);\n}")
    );
    assert_eq!(manager.element().media, "screen");
}

fn analyzed_manager() -> StyleManager {
    let environment = RenderEnvironment {
        image_analyzer: Some(Rc::new(LightImages)),
        ..RenderEnvironment::default()
    };
    manage_style(
        StyleElement::link(
            sheet_url(),
            Some("div { background-image: url(../img/hero.jpg); color: black }".to_owned()),
        ),
        environment,
        StyleManagerCallbacks::default(),
    )
}

#[test]
fn pending_render_is_committed() {
    let mut manager = analyzed_manager();
    let pending = manager.render(&Theme::default(), &[]).unwrap().unwrap();
    assert_eq!(pending.pending_count(), 1);
    assert_eq!(manager.state(), StyleManagerState::Rendering);
    assert_eq!(
        manager.override_css(),
        Some("div {\n    color: rgb(232, 230, 227);\n}")
    );

    let resolved = block_on(pending.resolve());
    assert!(manager.commit(resolved));
    assert_eq!(manager.state(), StyleManagerState::Unwatched);
    assert_eq!(
        manager.override_css(),
        Some("div {\n    background-image: none;\n    color: rgb(232, 230, 227);\n}")
    );
}

#[test]
fn stale_renders_are_discarded() {
    let mut manager = analyzed_manager();
    let theme = Theme::default();
    let first = manager.render(&theme, &[]).unwrap().unwrap();
    let second = manager.render(&theme, &[]).unwrap().unwrap();
    assert!(!first.is_current());
    assert!(second.is_current());

    let stale = block_on(first.resolve());
    assert!(!manager.commit(stale));
    assert!(manager.commit(block_on(second.resolve())));

    let third = manager.render(&theme, &[]).unwrap().unwrap();
    manager.pause();
    assert!(!manager.commit(block_on(third.resolve())));
}

#[test]
fn cors_copy_is_used_in_the_second_round() {
    let (starts, loading_start) = counter();
    let (ends, loading_end) = counter();
    let mut manager = manage_style(
        StyleElement::link(sheet_url(), None),
        RenderEnvironment::default(),
        StyleManagerCallbacks {
            loading_start: Some(loading_start),
            loading_end: Some(loading_end),
            ..StyleManagerCallbacks::default()
        },
    );
    assert!(manager.render(&Theme::default(), &[]).unwrap().is_none());
    assert_eq!(manager.override_css(), None);
    assert!(manager.details(false).is_none());

    let fetcher = FakeFetcher {
        response: Ok("a { background-image: url(../img/bg.png); color: black }".to_owned()),
    };
    assert!(block_on(manager.load_cors_copy(&fetcher)).unwrap());
    assert_eq!((starts.get(), ends.get()), (1, 1));
    assert!(manager.has_cors_copy());
    assert!(manager.details(false).is_none());
    assert_eq!(manager.details(true).map(<[_]>::len), Some(1));

    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(
        manager.override_css(),
        Some(
            "a {\n    background-image: url(\"https://cdn.example.net/img/bg.png\");\n    \
             color: rgb(232, 230, 227);\n}"
        )
    );

    assert!(!block_on(manager.load_cors_copy(&fetcher)).unwrap());
    manager.restore();
    assert!(!manager.has_cors_copy());
}

#[test]
fn cors_copy_failures() {
    let url = sheet_url();
    let (ends, loading_end) = counter();
    let mut manager = manage_style(
        StyleElement::link(url.clone(), None),
        RenderEnvironment::default(),
        StyleManagerCallbacks {
            loading_end: Some(loading_end),
            ..StyleManagerCallbacks::default()
        },
    );
    let fetcher = FakeFetcher {
        response: Err(FetchError::NotFound(url.clone())),
    };
    let error = block_on(manager.load_cors_copy(&fetcher)).unwrap_err();
    assert!(matches!(error, StyleManagerError::Fetch(FetchError::NotFound(ref failed)) if *failed == url));
    assert_eq!(ends.get(), 1);
    assert!(!manager.has_cors_copy());

    let mut inline = StyleElement::style("");
    inline.css_text = None;
    let mut manager = manage_style(
        inline,
        RenderEnvironment::default(),
        StyleManagerCallbacks::default(),
    );
    assert!(matches!(
        block_on(manager.load_cors_copy(&fetcher)),
        Err(StyleManagerError::MissingHref)
    ));
}

#[test]
fn loaded_sheet_is_themed() {
    let (updates, update) = counter();
    let mut manager = manage_style(
        StyleElement::link(sheet_url(), None),
        RenderEnvironment::default(),
        StyleManagerCallbacks {
            update: Some(update),
            ..StyleManagerCallbacks::default()
        },
    );
    assert!(manager.render(&Theme::default(), &[]).unwrap().is_none());
    assert_eq!(manager.override_css(), None);

    manager.watch().unwrap();
    manager
        .notify_mutations(vec![StyleMutation::SheetLoaded(Some(BODY_CSS.to_owned()))])
        .unwrap();
    assert_eq!(updates.get(), 1);
    assert!(manager.details(false).is_some());
    assert_eq!(manager.override_css(), Some(BODY_OVERRIDE));
}

#[test]
fn href_change_drops_cors_copy() {
    let (updates, update) = counter();
    let mut manager = manage_style(
        StyleElement::link(sheet_url(), None),
        RenderEnvironment::default(),
        StyleManagerCallbacks {
            update: Some(update),
            ..StyleManagerCallbacks::default()
        },
    );
    let fetcher = FakeFetcher {
        response: Ok("a { color: black }".to_owned()),
    };
    assert!(block_on(manager.load_cors_copy(&fetcher)).unwrap());
    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(manager.override_css(), Some("a {\n    color: rgb(232, 230, 227);\n}"));

    let moved = Url::parse("https://cdn.example.net/css/other.css").unwrap();
    manager.watch().unwrap();
    manager
        .notify_mutations(vec![StyleMutation::HrefChanged(Some(moved.clone()))])
        .unwrap();
    assert_eq!(updates.get(), 1);
    assert!(!manager.has_cors_copy());
    assert_eq!(manager.element().href, Some(moved));
    assert_eq!(manager.override_css(), None);

    let fetcher = FakeFetcher {
        response: Ok(BODY_CSS.to_owned()),
    };
    assert!(block_on(manager.load_cors_copy(&fetcher)).unwrap());
    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(manager.override_css(), Some(BODY_OVERRIDE));
}

#[test]
fn shared_variables_resolve_across_sheets() {
    let mut manager = manager("body { background: var(--bg) }");
    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(manager.override_css(), Some(""));

    let mut variables = VariablesStore::new();
    variables.define("--bg", "#fff");
    manager.set_variables(Some(Rc::new(variables)));
    manager.render(&Theme::default(), &[]).unwrap();
    assert_eq!(
        manager.override_css(),
        Some("body {\n    background: rgb(24, 26, 27);\n}")
    );
}
