/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A minimal stylesheet object model: style rules, conditional group rules
//! and opaque other at-rules, extracted with the CSS tokenizer.

use std::sync::LazyLock;

use cssparser::{ParseError, Parser, ParserInput, Token};
use log::debug;
use regex::Regex;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(--[^:\s]+|-?[A-Za-z][A-Za-z0-9-]*)\s*:(.*)$")
        .expect("Invalid declaration regex")
});
static IMPORTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!\s*important\s*$").expect("Invalid important regex"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid comment regex"));

/// At-rules whose block holds further rules.
const GROUP_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "-moz-document",
    "layer",
    "container",
];

#[derive(Clone, Debug, PartialEq)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CssStyleRule {
    pub selector_text: String,
    pub declarations: Vec<CssDeclaration>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CssRule {
    Style(CssStyleRule),
    /// `@media`, `@supports` and friends. `prelude` includes the at-keyword.
    Group { prelude: String, rules: Vec<CssRule> },
    /// Any other at-rule, kept only so indices line up with the source.
    Other { prelude: String },
}

/// Consume tokens up to and including the next `{` block opener or `;` at
/// this nesting level. Returns the position before it and whether it was a
/// block.
fn consume_prelude<'i, 't>(input: &mut Parser<'i, 't>) -> (cssparser::SourcePosition, Option<bool>) {
    loop {
        let before = input.position();
        match input.next_including_whitespace_and_comments() {
            Ok(Token::CurlyBracketBlock) => return (before, Some(true)),
            Ok(Token::Semicolon) => return (before, Some(false)),
            Ok(_) => {},
            Err(_) => return (before, None),
        }
    }
}

fn block_text<'i, 't>(input: &mut Parser<'i, 't>) -> &'i str {
    let start = input.position();
    input
        .parse_nested_block(|nested| {
            while nested.next_including_whitespace_and_comments().is_ok() {}
            Ok::<_, ParseError<'i, ()>>(nested.slice_from(start))
        })
        .unwrap_or("")
}

fn parse_rules<'i, 't>(input: &mut Parser<'i, 't>, rules: &mut Vec<CssRule>) {
    loop {
        input.skip_whitespace();
        let start = input.position();
        let token = match input.next() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::CDO | Token::CDC | Token::Semicolon => {},
            Token::CurlyBracketBlock => debug!("Skipping rule without selector"),
            Token::AtKeyword(ref name) => {
                let (end, block) = consume_prelude(input);
                let prelude = input.slice(start..end).trim().to_owned();
                let is_group = GROUP_AT_RULES
                    .iter()
                    .any(|group| name.eq_ignore_ascii_case(group));
                if block == Some(true) && is_group {
                    let mut nested_rules = Vec::new();
                    let _ = input.parse_nested_block(|nested| {
                        parse_rules(nested, &mut nested_rules);
                        Ok::<_, ParseError<'i, ()>>(())
                    });
                    rules.push(CssRule::Group {
                        prelude,
                        rules: nested_rules,
                    });
                } else {
                    rules.push(CssRule::Other { prelude });
                }
            },
            _ => {
                let (end, block) = consume_prelude(input);
                if block != Some(true) {
                    debug!("Skipping unterminated rule");
                    continue;
                }
                let selector_text = input.slice(start..end).trim().to_owned();
                let declarations = parse_declaration_block(block_text(input));
                rules.push(CssRule::Style(CssStyleRule {
                    selector_text,
                    declarations,
                }));
            },
        }
    }
}

pub fn parse_stylesheet(text: &str) -> Vec<CssRule> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    parse_rules(&mut parser, &mut rules);
    rules
}

fn split_top_level_semicolons(text: &str) -> Vec<&str> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut part_start = 0;
    loop {
        let before = parser.position().byte_index();
        let is_semicolon = match parser.next_including_whitespace_and_comments() {
            Ok(token) => matches!(token, Token::Semicolon),
            Err(_) => break,
        };
        if is_semicolon {
            parts.push(&text[part_start..before]);
            part_start = parser.position().byte_index();
        }
    }
    parts.push(&text[part_start..]);
    parts
}

fn parse_declaration(text: &str) -> Option<CssDeclaration> {
    let captures = DECLARATION.captures(text)?;
    let name = &captures[1];
    let is_custom = name.starts_with("--");
    let property = if is_custom {
        name.to_owned()
    } else {
        name.to_ascii_lowercase()
    };
    let mut value = if is_custom {
        captures[2].to_owned()
    } else {
        COMMENT.replace_all(&captures[2], "").into_owned()
    };
    let important = match IMPORTANT.find(&value) {
        Some(found) => {
            value.truncate(found.start());
            true
        },
        None => false,
    };
    Some(CssDeclaration {
        property,
        value: value.trim().to_owned(),
        important,
    })
}

/// Parse the body of a style rule or an inline `style` attribute.
pub fn parse_declaration_block(text: &str) -> Vec<CssDeclaration> {
    split_top_level_semicolons(text)
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .filter_map(parse_declaration)
        .collect()
}

/// Visit every style rule, descending into group rules.
pub fn iterate_style_rules<'a>(rules: &'a [CssRule], visit: &mut dyn FnMut(&'a CssStyleRule)) {
    for rule in rules {
        match rule {
            CssRule::Style(style) => visit(style),
            CssRule::Group { rules, .. } => iterate_style_rules(rules, visit),
            CssRule::Other { .. } => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations() {
        let declarations = parse_declaration_block(
            "COLOR: red; background: url(a;b.png) /* note */ !IMPORTANT; --Brand: #fff ;; bad",
        );
        assert_eq!(
            declarations,
            [
                CssDeclaration {
                    property: "color".to_owned(),
                    value: "red".to_owned(),
                    important: false,
                },
                CssDeclaration {
                    property: "background".to_owned(),
                    value: "url(a;b.png)".to_owned(),
                    important: true,
                },
                CssDeclaration {
                    property: "--Brand".to_owned(),
                    value: "#fff".to_owned(),
                    important: false,
                },
            ]
        );
    }

    #[test]
    fn nested_groups_and_other_at_rules() {
        let rules = parse_stylesheet(
            "@import url(x.css);\n\
             a, b:hover { color: red }\n\
             @media (min-width: 10px) { @supports (display: grid) { p { margin: 0 } } }\n\
             @font-face { font-family: x }",
        );
        assert_eq!(rules.len(), 4);
        assert!(matches!(&rules[0], CssRule::Other { prelude } if prelude == "@import url(x.css)"));
        let CssRule::Style(style) = &rules[1] else {
            panic!("expected a style rule");
        };
        assert_eq!(style.selector_text, "a, b:hover");
        let CssRule::Group { prelude, rules: inner } = &rules[2] else {
            panic!("expected a group rule");
        };
        assert_eq!(prelude, "@media (min-width: 10px)");
        assert!(matches!(&inner[0], CssRule::Group { rules, .. } if rules.len() == 1));
        assert!(matches!(&rules[3], CssRule::Other { .. }));

        let mut selectors = Vec::new();
        iterate_style_rules(&rules, &mut |rule| selectors.push(rule.selector_text.clone()));
        assert_eq!(selectors, ["a, b:hover", "p"]);
    }
}
