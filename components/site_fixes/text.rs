/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

/// Split a block of text into one entry per non-blank line.
pub fn parse_array(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_array_skips_blank_lines() {
        let items = parse_array("\r\n  a.com \n\n*.b.com\r\n   \n");
        assert_eq!(items, vec!["a.com".to_string(), "*.b.com".to_string()]);
    }
}
