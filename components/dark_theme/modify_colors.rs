/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Theme-parameterized color transforms.
//!
//! Backgrounds are pulled toward the theme's background pole, text toward
//! its text pole, keeping hue and saturation for chromatic colors. The
//! result then goes through the brightness, contrast, sepia and grayscale
//! filter matrix of the theme.

use log::warn;

use crate::color::{Hsla, Rgba, parse_color, rgb_to_string};
use crate::theme::{Theme, ThemeMode};

const MAX_BG_LIGHTNESS: f32 = 0.4;
const MIN_FG_LIGHTNESS: f32 = 0.55;

const FALLBACK_DARK_BACKGROUND: Rgba = Rgba::new(24.0, 26.0, 27.0, 1.0);
const FALLBACK_DARK_TEXT: Rgba = Rgba::new(232.0, 230.0, 227.0, 1.0);
const FALLBACK_LIGHT_BACKGROUND: Rgba = Rgba::new(220.0, 218.0, 215.0, 1.0);
const FALLBACK_LIGHT_TEXT: Rgba = Rgba::new(24.0, 26.0, 27.0, 1.0);

fn scale(x: f32, in_low: f32, in_high: f32, out_low: f32, out_high: f32) -> f32 {
    (x - in_low) * (out_high - out_low) / (in_high - in_low) + out_low
}

fn pole(color: &str, fallback: Rgba) -> Hsla {
    match parse_color(color) {
        Some(color) => color.to_hsla(),
        None => {
            warn!("Invalid theme scheme color {color}");
            fallback.to_hsla()
        },
    }
}

fn background_pole(theme: &Theme) -> Hsla {
    match theme.mode {
        ThemeMode::Dark => pole(&theme.dark_scheme_background_color, FALLBACK_DARK_BACKGROUND),
        ThemeMode::Light => pole(&theme.light_scheme_background_color, FALLBACK_LIGHT_BACKGROUND),
    }
}

fn text_pole(theme: &Theme) -> Hsla {
    match theme.mode {
        ThemeMode::Dark => pole(&theme.dark_scheme_text_color, FALLBACK_DARK_TEXT),
        ThemeMode::Light => pole(&theme.light_scheme_text_color, FALLBACK_LIGHT_TEXT),
    }
}

fn modify_bg_hsl(Hsla { h, s, l, a }: Hsla, pole: Hsla) -> Hsla {
    let is_dark = l < 0.5;
    let is_blue = h > 200.0 && h < 280.0;
    let is_neutral = s < 0.12 || (l > 0.8 && is_blue);
    if is_dark {
        let lx = scale(l, 0.0, 0.5, 0.0, pole.l);
        if is_neutral {
            return Hsla { h: pole.h, s: pole.s, l: lx, a };
        }
        return Hsla { h, s, l: lx, a };
    }

    let lx = scale(l, 0.5, 1.0, MAX_BG_LIGHTNESS, pole.l);
    if is_neutral {
        return Hsla { h: pole.h, s: pole.s, l: lx, a };
    }
    // Dark yellows and cyans look muddy, push them toward orange or blue.
    let hx = if h > 60.0 && h < 180.0 {
        if h > 120.0 {
            scale(h, 120.0, 180.0, 135.0, 180.0)
        } else {
            scale(h, 60.0, 120.0, 60.0, 105.0)
        }
    } else {
        h
    };
    Hsla { h: hx, s, l: lx, a }
}

fn modify_fg_hsl(Hsla { h, s, l, a }: Hsla, pole: Hsla) -> Hsla {
    let is_light = l > 0.5;
    let is_neutral = l < 0.2 || s < 0.24;
    let is_blue = h > 205.0 && h < 245.0;
    if is_light {
        let lx = scale(l, 0.5, 1.0, MIN_FG_LIGHTNESS, pole.l);
        if is_neutral {
            return Hsla { h: pole.h, s: pole.s, l: lx, a };
        }
        return Hsla { h, s, l: lx, a };
    }

    if is_neutral {
        let lx = scale(l, 0.0, 0.5, pole.l, MIN_FG_LIGHTNESS);
        return Hsla { h: pole.h, s: pole.s, l: lx, a };
    }
    if is_blue {
        let hx = scale(h, 205.0, 245.0, 205.0, 220.0);
        let lx = scale(l, 0.0, 0.5, pole.l, (MIN_FG_LIGHTNESS + 0.05).min(1.0));
        return Hsla { h: hx, s, l: lx, a };
    }
    let lx = scale(l, 0.0, 0.5, pole.l, MIN_FG_LIGHTNESS);
    Hsla { h, s, l: lx, a }
}

fn modify_border_hsl(Hsla { h, s, l, a }: Hsla, fg_pole: Hsla, bg_pole: Hsla) -> Hsla {
    let is_dark = l < 0.5;
    let is_neutral = l < 0.2 || s < 0.24;
    let (hx, sx) = match (is_neutral, is_dark) {
        (true, true) => (fg_pole.h, fg_pole.s),
        (true, false) => (bg_pole.h, bg_pole.s),
        (false, _) => (h, s),
    };
    Hsla {
        h: hx,
        s: sx,
        l: scale(l, 0.0, 1.0, 0.5, 0.2),
        a,
    }
}

/// Light mode keeps colors close to the source, only squeezing lightness
/// between the two light scheme poles.
fn modify_light_scheme_hsl(Hsla { h, s, l, a }: Hsla, dark_pole: Hsla, light_pole: Hsla) -> Hsla {
    let is_dark = l < 0.5;
    let is_neutral = if is_dark {
        l < 0.2 || s < 0.12
    } else {
        let is_blue = h > 200.0 && h < 280.0;
        s < 0.24 || (l > 0.8 && is_blue)
    };
    let (hx, sx) = match (is_neutral, is_dark) {
        (true, true) => (dark_pole.h, dark_pole.s),
        (true, false) => (light_pole.h, light_pole.s),
        (false, _) => (h, s),
    };
    Hsla {
        h: hx,
        s: sx,
        l: scale(l, 0.0, 1.0, dark_pole.l, light_pole.l),
        a,
    }
}

type Matrix = [[f32; 5]; 5];

const IDENTITY: Matrix = [
    [1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0],
];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    let mut result = [[0.0; 5]; 5];
    for (i, row) in result.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..5).map(|k| m1[i][k] * m2[k][j]).sum();
        }
    }
    result
}

fn brightness_matrix(v: f32) -> Matrix {
    [
        [v, 0.0, 0.0, 0.0, 0.0],
        [0.0, v, 0.0, 0.0, 0.0],
        [0.0, 0.0, v, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]
}

fn contrast_matrix(v: f32) -> Matrix {
    let t = (1.0 - v) / 2.0;
    [
        [v, 0.0, 0.0, 0.0, t],
        [0.0, v, 0.0, 0.0, t],
        [0.0, 0.0, v, 0.0, t],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]
}

fn sepia_matrix(v: f32) -> Matrix {
    [
        [0.393 + 0.607 * (1.0 - v), 0.769 - 0.769 * (1.0 - v), 0.189 - 0.189 * (1.0 - v), 0.0, 0.0],
        [0.349 - 0.349 * (1.0 - v), 0.686 + 0.314 * (1.0 - v), 0.168 - 0.168 * (1.0 - v), 0.0, 0.0],
        [0.272 - 0.272 * (1.0 - v), 0.534 - 0.534 * (1.0 - v), 0.131 + 0.869 * (1.0 - v), 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]
}

fn grayscale_matrix(v: f32) -> Matrix {
    [
        [0.2126 + 0.7874 * (1.0 - v), 0.7152 - 0.7152 * (1.0 - v), 0.0722 - 0.0722 * (1.0 - v), 0.0, 0.0],
        [0.2126 - 0.2126 * (1.0 - v), 0.7152 + 0.2848 * (1.0 - v), 0.0722 - 0.0722 * (1.0 - v), 0.0, 0.0],
        [0.2126 - 0.2126 * (1.0 - v), 0.7152 - 0.7152 * (1.0 - v), 0.0722 + 0.9278 * (1.0 - v), 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]
}

fn filter_matrix(theme: &Theme) -> Matrix {
    let mut matrix = IDENTITY;
    if theme.sepia != 0.0 {
        matrix = multiply(&matrix, &sepia_matrix(theme.sepia / 100.0));
    }
    if theme.grayscale != 0.0 {
        matrix = multiply(&matrix, &grayscale_matrix(theme.grayscale / 100.0));
    }
    if theme.contrast != 100.0 {
        matrix = multiply(&matrix, &contrast_matrix(theme.contrast / 100.0));
    }
    if theme.brightness != 100.0 {
        matrix = multiply(&matrix, &brightness_matrix(theme.brightness / 100.0));
    }
    matrix
}

fn apply_filter(color: Rgba, theme: &Theme) -> Rgba {
    let matrix = filter_matrix(theme);
    if matrix == IDENTITY {
        return color;
    }
    let input = [color.r / 255.0, color.g / 255.0, color.b / 255.0, 1.0, 1.0];
    let channel = |row: usize| -> f32 {
        let value: f32 = (0..5).map(|k| matrix[row][k] * input[k]).sum();
        (value.clamp(0.0, 1.0) * 255.0).round()
    };
    Rgba::new(channel(0), channel(1), channel(2), color.a)
}

fn finish(hsla: Hsla, theme: &Theme) -> String {
    rgb_to_string(&apply_filter(Rgba::from_hsla(hsla), theme))
}

pub fn modify_background_color(color: &Rgba, theme: &Theme) -> String {
    let hsla = color.to_hsla();
    let modified = match theme.mode {
        ThemeMode::Dark => modify_bg_hsl(hsla, background_pole(theme)),
        ThemeMode::Light => modify_light_scheme_hsl(hsla, text_pole(theme), background_pole(theme)),
    };
    finish(modified, theme)
}

pub fn modify_foreground_color(color: &Rgba, theme: &Theme) -> String {
    let hsla = color.to_hsla();
    let modified = match theme.mode {
        ThemeMode::Dark => modify_fg_hsl(hsla, text_pole(theme)),
        ThemeMode::Light => modify_light_scheme_hsl(hsla, text_pole(theme), background_pole(theme)),
    };
    finish(modified, theme)
}

pub fn modify_border_color(color: &Rgba, theme: &Theme) -> String {
    let hsla = color.to_hsla();
    let modified = match theme.mode {
        ThemeMode::Dark => modify_border_hsl(hsla, text_pole(theme), background_pole(theme)),
        ThemeMode::Light => modify_light_scheme_hsl(hsla, text_pole(theme), background_pole(theme)),
    };
    finish(modified, theme)
}

pub fn modify_shadow_color(color: &Rgba, theme: &Theme) -> String {
    modify_background_color(color, theme)
}

pub fn modify_gradient_color(color: &Rgba, theme: &Theme) -> String {
    modify_background_color(color, theme)
}
