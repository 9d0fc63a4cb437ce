/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Locating colors, URLs, gradients and function calls inside raw CSS
//! values. Everything works on byte ranges of the original text, so callers
//! can splice replacements back without reserializing the rest.

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use cssparser::{ParseError, Parser, ParserInput, Token};
use regex::{Captures, Regex};
use url::Url;

use crate::color::{Rgba, is_color_function, parse_color};

/// `url(...)` with a double quoted, single quoted or bare argument.
pub static CSS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)\s]*))\s*\)"#)
        .expect("Invalid CSS url regex")
});

static HAS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\s*\(").expect("Invalid url probe regex"));
static HAS_GRADIENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:linear|radial|conic)-gradient\s*\(").expect("Invalid gradient probe regex")
});
static HAS_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)var\s*\(").expect("Invalid var probe regex"));

pub fn has_url(value: &str) -> bool {
    HAS_URL.is_match(value)
}

pub fn has_gradient(value: &str) -> bool {
    HAS_GRADIENT.is_match(value)
}

pub fn has_var(value: &str) -> bool {
    HAS_VAR.is_match(value)
}

/// One `url(...)` occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct CssUrl {
    pub range: Range<usize>,
    /// The unquoted argument.
    pub value: String,
}

fn url_from_captures(captures: &Captures<'_>) -> Option<CssUrl> {
    let whole = captures.get(0)?;
    let value = (1..=3)
        .find_map(|group| captures.get(group))
        .map_or("", |m| m.as_str());
    Some(CssUrl {
        range: whole.range(),
        value: value.trim().to_owned(),
    })
}

pub fn find_css_urls(value: &str) -> Vec<CssUrl> {
    CSS_URL_REGEX
        .captures_iter(value)
        .filter_map(|captures| url_from_captures(&captures))
        .collect()
}

pub fn is_data_url(url: &str) -> bool {
    url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Resolve `target` against `base`. Absolute targets ignore the base.
pub fn get_absolute_url(base: Option<&Url>, target: &str) -> Option<Url> {
    match Url::parse(target) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(target).ok(),
        Err(_) => None,
    }
}

/// Rewrite every relative `url()` of a stylesheet so it keeps pointing at the
/// same resource once the text is moved under another base.
pub fn replace_css_relative_urls_with_absolute(text: &str, base: &Url) -> String {
    CSS_URL_REGEX
        .replace_all(text, |captures: &Captures<'_>| {
            let original = captures[0].to_owned();
            let Some(css_url) = url_from_captures(captures) else {
                return original;
            };
            if css_url.value.is_empty() || is_data_url(&css_url.value) {
                return original;
            }
            match get_absolute_url(Some(base), &css_url.value) {
                Some(absolute) => format!("url(\"{absolute}\")"),
                None => original,
            }
        })
        .into_owned()
}

/// Split on commas that are not nested in any function or block. The parts
/// are not trimmed.
pub fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut part_start = 0;
    loop {
        let before = parser.position().byte_index();
        let is_comma = match parser.next_including_whitespace_and_comments() {
            Ok(token) => matches!(token, Token::Comma),
            Err(_) => break,
        };
        if is_comma {
            parts.push(&value[part_start..before]);
            part_start = parser.position().byte_index();
        }
    }
    parts.push(&value[part_start..]);
    parts
}

fn skip_block<'i, 't>(input: &mut Parser<'i, 't>) {
    let _ = input.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'i, ()>>(())
    });
}

fn collect_colors<'i, 't>(input: &mut Parser<'i, 't>, colors: &mut Vec<(Range<usize>, Rgba)>) {
    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::Hash(_) | Token::IDHash(_) | Token::Ident(_) => {
                if let Some(color) = parse_color(input.slice_from(start)) {
                    colors.push((start.byte_index()..input.position().byte_index(), color));
                }
            },
            Token::Function(ref name) if is_color_function(name) => {
                skip_block(input);
                if let Some(color) = parse_color(input.slice_from(start)) {
                    colors.push((start.byte_index()..input.position().byte_index(), color));
                }
            },
            // Colors in `var()` fallbacks belong to the variable, and `url()`
            // arguments are never colors.
            Token::Function(ref name)
                if name.eq_ignore_ascii_case("var") || name.eq_ignore_ascii_case("url") => {},
            Token::Function(_) |
            Token::ParenthesisBlock |
            Token::SquareBracketBlock |
            Token::CurlyBracketBlock => {
                let _ = input.parse_nested_block(|nested| {
                    collect_colors(nested, colors);
                    Ok::<_, ParseError<'i, ()>>(())
                });
            },
            _ => {},
        }
    }
}

/// Every color literal in `value` with its byte range, in order.
pub fn find_colors(value: &str) -> Vec<(Range<usize>, Rgba)> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut colors = Vec::new();
    collect_colors(&mut parser, &mut colors);
    colors
}

/// A function call located in a CSS value.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// The whole call, name through closing parenthesis.
    pub range: Range<usize>,
    /// Everything between the parentheses.
    pub arguments: Range<usize>,
    /// `false` when the value ended before the closing parenthesis.
    pub terminated: bool,
}

fn collect_functions<'i, 't>(
    input: &mut Parser<'i, 't>,
    predicate: &dyn Fn(&str) -> bool,
    calls: &mut Vec<FunctionCall>,
) {
    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::Function(ref name) if predicate(name) => {
                let arguments_start = input.position();
                let arguments_end = input.parse_nested_block(|nested| {
                    while nested.next_including_whitespace_and_comments().is_ok() {}
                    Ok::<_, ParseError<'i, ()>>(nested.position())
                });
                let end = input.position().byte_index();
                let arguments_end = arguments_end.map_or(end, |position| position.byte_index());
                calls.push(FunctionCall {
                    name: name.to_string(),
                    range: start.byte_index()..end,
                    arguments: arguments_start.byte_index()..arguments_end,
                    terminated: end > arguments_end,
                });
            },
            Token::Function(_) |
            Token::ParenthesisBlock |
            Token::SquareBracketBlock |
            Token::CurlyBracketBlock => {
                let _ = input.parse_nested_block(|nested| {
                    collect_functions(nested, predicate, calls);
                    Ok::<_, ParseError<'i, ()>>(())
                });
            },
            _ => {},
        }
    }
}

/// Outermost calls of the functions accepted by `predicate`. Calls nested in
/// a matching call are not reported separately.
pub fn find_functions(value: &str, predicate: impl Fn(&str) -> bool) -> Vec<FunctionCall> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut calls = Vec::new();
    collect_functions(&mut parser, &predicate, &mut calls);
    calls
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GradientKind {
    Linear,
    Radial,
    Conic,
}

impl GradientKind {
    fn as_str(self) -> &'static str {
        match self {
            GradientKind::Linear => "linear",
            GradientKind::Radial => "radial",
            GradientKind::Conic => "conic",
        }
    }
}

/// Split a function name into gradient kind and `repeating-` flag.
pub fn gradient_kind(function_name: &str) -> Option<(GradientKind, bool)> {
    let name = function_name.to_ascii_lowercase();
    let (repeating, name) = match name.strip_prefix("repeating-") {
        Some(rest) => (true, rest),
        None => (false, name.as_str()),
    };
    let kind = match name {
        "linear-gradient" => GradientKind::Linear,
        "radial-gradient" => GradientKind::Radial,
        "conic-gradient" => GradientKind::Conic,
        _ => return None,
    };
    Some((kind, repeating))
}

pub fn is_gradient_function(function_name: &str) -> bool {
    gradient_kind(function_name).is_some()
}

#[derive(Debug, PartialEq)]
pub enum GradientError {
    /// The text is not a single gradient function call.
    NotAGradient,
    /// The closing parenthesis is missing.
    Unterminated,
    /// No argument carries a color.
    NoColorStops,
}

impl fmt::Display for GradientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradientError::NotAGradient => write!(f, "not a gradient function"),
            GradientError::Unterminated => write!(f, "unterminated gradient"),
            GradientError::NoColorStops => write!(f, "gradient has no color stops"),
        }
    }
}

impl std::error::Error for GradientError {}

/// A gradient split into its top-level arguments: the optional direction or
/// shape followed by the color stops.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient<'a> {
    pub kind: GradientKind,
    pub repeating: bool,
    pub arguments: Vec<&'a str>,
}

impl Gradient<'_> {
    /// The function name, `repeating-` prefix included.
    pub fn function_name(&self) -> String {
        format!(
            "{}{}-gradient",
            if self.repeating { "repeating-" } else { "" },
            self.kind.as_str()
        )
    }
}

pub fn parse_gradient(text: &str) -> Result<Gradient<'_>, GradientError> {
    let text = text.trim();
    let calls = find_functions(text, is_gradient_function);
    let call = match calls.as_slice() {
        [call] if call.range == (0..text.len()) => call,
        _ => return Err(GradientError::NotAGradient),
    };
    if !call.terminated {
        return Err(GradientError::Unterminated);
    }
    let (kind, repeating) = gradient_kind(&call.name).ok_or(GradientError::NotAGradient)?;
    let arguments: Vec<&str> = split_top_level_commas(&text[call.arguments.clone()])
        .into_iter()
        .map(str::trim)
        .filter(|argument| !argument.is_empty())
        .collect();
    if !arguments
        .iter()
        .any(|argument| !find_colors(argument).is_empty())
    {
        return Err(GradientError::NoColorStops);
    }
    Ok(Gradient {
        kind,
        repeating,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_color_ranges(value: &str) -> Vec<Range<usize>> {
        find_colors(value).into_iter().map(|(range, _)| range).collect()
    }

    fn slices<'a>(value: &'a str, ranges: &[Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|range| &value[range.clone()]).collect()
    }

    #[test]
    fn locates_colors() {
        let value = "1px solid #ABC, 0 0 rgba(0, 0, 0, .5) inset, blue";
        assert_eq!(
            slices(value, &find_color_ranges(value)),
            ["#ABC", "rgba(0, 0, 0, .5)", "blue"]
        );
        let value = "url(red.png) var(--x, red) solid";
        assert!(find_color_ranges(value).is_empty());
    }

    #[test]
    fn colors_inside_gradients() {
        let value = "linear-gradient(to right, white 0%, hsl(0, 0%, 0%) 100%)";
        assert_eq!(
            slices(value, &find_color_ranges(value)),
            ["white", "hsl(0, 0%, 0%)"]
        );
    }

    #[test]
    fn splits_on_top_level_commas_only() {
        assert_eq!(
            split_top_level_commas("0 0 2px rgb(1, 2, 3), 1px 1px red"),
            ["0 0 2px rgb(1, 2, 3)", " 1px 1px red"]
        );
        assert_eq!(split_top_level_commas("none"), ["none"]);
    }

    #[test]
    fn finds_outermost_calls() {
        let value = "url(a.png), repeating-linear-gradient(red, linear-gradient(blue, red)) , x";
        let calls = find_functions(value, is_gradient_function);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "repeating-linear-gradient");
        assert_eq!(
            &value[calls[0].range.clone()],
            "repeating-linear-gradient(red, linear-gradient(blue, red))"
        );
        assert!(calls[0].terminated);

        let unterminated = find_functions("linear-gradient(red, blue", is_gradient_function);
        assert!(!unterminated[0].terminated);
    }

    #[test]
    fn parses_gradients() {
        let gradient = parse_gradient("radial-gradient(circle at center, #fff, rgba(0,0,0,0.5) 80%)")
            .unwrap();
        assert_eq!(gradient.kind, GradientKind::Radial);
        assert!(!gradient.repeating);
        assert_eq!(
            gradient.arguments,
            ["circle at center", "#fff", "rgba(0,0,0,0.5) 80%"]
        );
        assert_eq!(gradient.function_name(), "radial-gradient");
        let repeating = parse_gradient(" repeating-conic-gradient(red 10%, blue 20%) ").unwrap();
        assert_eq!(repeating.function_name(), "repeating-conic-gradient");
        assert_eq!(
            parse_gradient("linear-gradient(red, blue"),
            Err(GradientError::Unterminated)
        );
        assert_eq!(
            parse_gradient("linear-gradient(to right, var(--a), var(--b))"),
            Err(GradientError::NoColorStops)
        );
        assert_eq!(parse_gradient("url(a.png)"), Err(GradientError::NotAGradient));
    }

    #[test]
    fn urls() {
        let value = r#"url("a.png"), url( 'b c.png' ), url(data:image/png;base64,AAAA)"#;
        let urls: Vec<String> = find_css_urls(value).into_iter().map(|u| u.value).collect();
        assert_eq!(urls, ["a.png", "b c.png", "data:image/png;base64,AAAA"]);

        let base = Url::parse("https://cdn.example.com/css/site.css").unwrap();
        assert_eq!(
            replace_css_relative_urls_with_absolute(
                "a { background: url(../img/bg.png) } b { background: url(data:x) }",
                &base
            ),
            r#"a { background: url("https://cdn.example.com/img/bg.png") } b { background: url(data:x) }"#
        );
        assert_eq!(
            get_absolute_url(Some(&base), "//other.org/x.png").map(String::from),
            Some("https://other.org/x.png".to_owned())
        );
        assert_eq!(get_absolute_url(None, "x.png"), None);
    }
}
