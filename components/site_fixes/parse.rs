/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Record-level parsing of the site-fix configuration text.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::text::parse_array;

/// A line made only of two or more `=`, separating records.
pub(crate) static RECORD_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*={2,}\s*$").expect("Invalid record delimiter regex"));

/// One to three space-separated UPPERCASE words alone on a line.
static COMMAND_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+(\s[A-Z]+){0,2}$").expect("Invalid command regex"));

/// A record type the config parser can fill in.
pub trait SiteProps: Default {
    /// URL rules the record applies to.
    fn urls(&self) -> &[String];

    fn set_urls(&mut self, urls: Vec<String>);

    /// Store the value block of `command`. Returns `false` for commands the
    /// record type does not know; those are skipped.
    fn apply_command(&mut self, command: &str, value: &str) -> bool;
}

pub(crate) fn is_command_line(line: &str) -> bool {
    COMMAND_LINE.is_match(line.trim_end_matches('\r'))
}

/// Indices of the command lines in `lines`.
pub(crate) fn command_line_indices(lines: &[&str]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_command_line(line))
        .map(|(idx, _)| idx)
        .collect()
}

/// Parse a single record. Returns `None` when the block has no command line.
pub(crate) fn parse_record<T: SiteProps>(block: &str) -> Option<T> {
    let lines: Vec<&str> = block.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let commands = command_line_indices(&lines);
    let first_command = *commands.first()?;

    let mut record = T::default();
    record.set_urls(parse_array(&lines[..first_command].join("\n")));

    for (i, &command_idx) in commands.iter().enumerate() {
        let command = lines[command_idx].trim();
        let value_end = commands.get(i + 1).copied().unwrap_or(lines.len());
        let value = lines[command_idx + 1..value_end].join("\n");
        if !record.apply_command(command, &value) {
            debug!("Ignoring unknown site fix command {command}");
        }
    }

    Some(record)
}

/// Parse a whole configuration text into records. Blocks without any command
/// line are dropped.
pub fn parse_sites_fixes_config<T: SiteProps>(text: &str) -> Vec<T> {
    let text = text.replace('\r', "");
    RECORD_DELIMITER
        .split(&text)
        .filter_map(parse_record::<T>)
        .collect()
}
