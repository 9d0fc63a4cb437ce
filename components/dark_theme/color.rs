/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Color values, CSS color parsing and serialization.
//!
//! Only the sRGB notations pages actually use are recognized: hex, named
//! colors, `transparent`, `rgb[a]()` and `hsl[a]()` in both the legacy comma
//! and the space-separated syntax.

use cssparser::color::{parse_hash_color, parse_named_color};
use cssparser::{ParseError, Parser, ParserInput, Token};

/// An sRGB color. Channels are in `0..=255`, alpha in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Hue in degrees `0..360`, saturation and lightness in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_hsla(self) -> Hsla {
        let r = self.r / 255.0;
        let g = self.g / 255.0;
        let b = self.b / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let chroma = max - min;
        let l = (max + min) / 2.0;

        if chroma == 0.0 {
            return Hsla {
                h: 0.0,
                s: 0.0,
                l,
                a: self.a,
            };
        }

        let sector = if max == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };
        let s = chroma / (1.0 - (2.0 * l - 1.0).abs());
        Hsla {
            h: (sector * 60.0).rem_euclid(360.0),
            s: s.clamp(0.0, 1.0),
            l,
            a: self.a,
        }
    }

    pub fn from_hsla(hsla: Hsla) -> Self {
        let Hsla { h, s, l, a } = hsla;
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = h.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        Self {
            r: (r + m) * 255.0,
            g: (g + m) * 255.0,
            b: (b + m) * 255.0,
            a,
        }
    }
}

enum Argument {
    Number(f32),
    Percentage(f32),
    /// Angle, already converted to degrees.
    Angle(f32),
}

fn parse_function_arguments<'i, 't>(
    input: &mut Parser<'i, 't>,
) -> Result<Vec<Argument>, ParseError<'i, ()>> {
    let mut arguments = Vec::new();
    while !input.is_exhausted() {
        let token = input.next()?.clone();
        let argument = match token {
            Token::Number { value, .. } => Argument::Number(value),
            Token::Percentage { unit_value, .. } => Argument::Percentage(unit_value),
            Token::Dimension {
                value, ref unit, ..
            } => match unit.to_ascii_lowercase().as_str() {
                "deg" => Argument::Angle(value),
                "grad" => Argument::Angle(value * 0.9),
                "rad" => Argument::Angle(value.to_degrees()),
                "turn" => Argument::Angle(value * 360.0),
                _ => return Err(input.new_custom_error(())),
            },
            Token::Ident(ref ident) if ident.eq_ignore_ascii_case("none") => Argument::Number(0.0),
            Token::Comma | Token::Delim('/') => continue,
            _ => return Err(input.new_custom_error(())),
        };
        arguments.push(argument);
    }
    Ok(arguments)
}

fn channel(argument: &Argument) -> f32 {
    match *argument {
        Argument::Number(value) | Argument::Angle(value) => value,
        Argument::Percentage(value) => value * 255.0,
    }
    .clamp(0.0, 255.0)
}

fn unit_fraction(argument: &Argument) -> f32 {
    match *argument {
        Argument::Number(value) | Argument::Angle(value) => value / 100.0,
        Argument::Percentage(value) => value,
    }
    .clamp(0.0, 1.0)
}

fn alpha(argument: Option<&Argument>) -> f32 {
    match argument {
        Some(Argument::Number(value)) => value.clamp(0.0, 1.0),
        Some(Argument::Percentage(value)) => value.clamp(0.0, 1.0),
        Some(Argument::Angle(_)) | None => 1.0,
    }
}

fn color_from_function(name: &str, arguments: &[Argument]) -> Option<Rgba> {
    if arguments.len() != 3 && arguments.len() != 4 {
        return None;
    }
    match name {
        "rgb" | "rgba" => Some(Rgba::new(
            channel(&arguments[0]),
            channel(&arguments[1]),
            channel(&arguments[2]),
            alpha(arguments.get(3)),
        )),
        "hsl" | "hsla" => {
            let h = match arguments[0] {
                Argument::Number(value) | Argument::Angle(value) => value,
                Argument::Percentage(_) => return None,
            };
            Some(Rgba::from_hsla(Hsla {
                h,
                s: unit_fraction(&arguments[1]),
                l: unit_fraction(&arguments[2]),
                a: alpha(arguments.get(3)),
            }))
        },
        _ => None,
    }
}

/// `true` for the functional notations [`parse_color`] understands.
pub fn is_color_function(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "rgb" | "rgba" | "hsl" | "hsla"
    )
}

fn parse_color_token<'i, 't>(input: &mut Parser<'i, 't>) -> Result<Rgba, ParseError<'i, ()>> {
    let token = input.next()?.clone();
    match token {
        Token::Hash(ref value) | Token::IDHash(ref value) => {
            let (r, g, b, a) =
                parse_hash_color(value.as_bytes()).map_err(|()| input.new_custom_error::<(), ()>(()))?;
            Ok(Rgba::new(r as f32, g as f32, b as f32, a))
        },
        Token::Ident(ref name) => {
            let name = name.to_ascii_lowercase();
            if name == "transparent" {
                return Ok(Rgba::new(0.0, 0.0, 0.0, 0.0));
            }
            let (r, g, b) = parse_named_color(&name).map_err(|()| input.new_custom_error::<(), ()>(()))?;
            Ok(Rgba::new(r as f32, g as f32, b as f32, 1.0))
        },
        Token::Function(ref name) => {
            let name = name.to_ascii_lowercase();
            let arguments = input.parse_nested_block(|input| parse_function_arguments(input))?;
            color_from_function(&name, &arguments).ok_or_else(|| input.new_custom_error(()))
        },
        _ => Err(input.new_custom_error(())),
    }
}

/// Parse a whole CSS value as a single color. Anything else, including
/// `currentcolor` and keywords like `none`, yields `None`.
pub fn parse_color(text: &str) -> Option<Rgba> {
    let mut input = ParserInput::new(text.trim());
    let mut parser = Parser::new(&mut input);
    let color = parse_color_token(&mut parser).ok()?;
    parser.expect_exhausted().ok()?;
    Some(color)
}

fn format_alpha(alpha: f32) -> String {
    let text = format!("{:.3}", alpha.clamp(0.0, 1.0));
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// `rgb(r, g, b)`, or `rgba(r, g, b, a)` for translucent colors.
pub fn rgb_to_string(color: &Rgba) -> String {
    let r = color.r.round().clamp(0.0, 255.0) as u8;
    let g = color.g.round().clamp(0.0, 255.0) as u8;
    let b = color.b.round().clamp(0.0, 255.0) as u8;
    if color.a < 1.0 {
        format!("rgba({r}, {g}, {b}, {})", format_alpha(color.a))
    } else {
        format!("rgb({r}, {g}, {b})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_notations() {
        let red = Some(Rgba::new(255.0, 0.0, 0.0, 1.0));
        assert_eq!(parse_color("red"), red);
        assert_eq!(parse_color("  RED "), red);
        assert_eq!(parse_color("#f00"), red);
        assert_eq!(parse_color("#ff0000"), red);
        assert_eq!(parse_color("rgb(255, 0, 0)"), red);
        assert_eq!(parse_color("rgb(100% 0% 0%)"), red);
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), red);
        assert_eq!(parse_color("hsl(0deg 100% 50%)"), red);
        assert_eq!(
            parse_color("rgba(0, 0, 255, 0.5)"),
            Some(Rgba::new(0.0, 0.0, 255.0, 0.5))
        );
        assert_eq!(
            parse_color("rgb(0 0 255 / 25%)"),
            Some(Rgba::new(0.0, 0.0, 255.0, 0.25))
        );
        assert_eq!(
            parse_color("transparent"),
            Some(Rgba::new(0.0, 0.0, 0.0, 0.0))
        );
    }

    #[test]
    fn rejects_non_colors() {
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("none"), None);
        assert_eq!(parse_color("currentcolor"), None);
        assert_eq!(parse_color("red blue"), None);
        assert_eq!(parse_color("1px solid red"), None);
        assert_eq!(parse_color("rgb(1, 2)"), None);
        assert_eq!(parse_color("#ggg"), None);
        assert_eq!(parse_color("url(a.png)"), None);
    }

    #[test]
    fn hsl_round_trip() {
        for color in [
            Rgba::new(24.0, 26.0, 27.0, 1.0),
            Rgba::new(232.0, 230.0, 227.0, 1.0),
            Rgba::new(0.0, 90.0, 156.0, 0.5),
            Rgba::new(255.0, 255.0, 255.0, 1.0),
        ] {
            let back = Rgba::from_hsla(color.to_hsla());
            assert!((back.r - color.r).abs() < 0.5, "{color:?} -> {back:?}");
            assert!((back.g - color.g).abs() < 0.5, "{color:?} -> {back:?}");
            assert!((back.b - color.b).abs() < 0.5, "{color:?} -> {back:?}");
            assert_eq!(back.a, color.a);
        }
    }

    #[test]
    fn serializes() {
        assert_eq!(rgb_to_string(&Rgba::new(255.0, 25.6, 0.2, 1.0)), "rgb(255, 26, 0)");
        assert_eq!(rgb_to_string(&Rgba::new(0.0, 0.0, 0.0, 0.5)), "rgba(0, 0, 0, 0.5)");
    }
}
