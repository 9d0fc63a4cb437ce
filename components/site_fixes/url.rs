/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host and URL predicates used to classify and match site-fix URL rules.
//!
//! Rules come in three shapes: plain domains (`example.com`), wildcard
//! domains (`*.example.com`, `example.*`) and everything else, which is
//! matched through [`is_url_matched`]. A rule wrapped in slashes
//! (`/^example\.(com|net)$/`) is treated as a regular expression.

use std::sync::LazyLock;

use log::{debug, warn};
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use url::Url;

/// Compiled URL templates, keyed by template text. `None` marks a template
/// that failed to compile so it is not retried.
static URL_TEMPLATE_CACHE: LazyLock<Mutex<FxHashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// The template cache is dropped whole once it holds this many entries.
const URL_TEMPLATE_CACHE_LIMIT: usize = 1024;

/// Forget every compiled URL template.
pub(crate) fn clear_url_template_cache() {
    URL_TEMPLATE_CACHE.lock().clear();
}

#[cfg(test)]
fn url_template_cache_len() -> usize {
    URL_TEMPLATE_CACHE.lock().len()
}

/// Lowercase host name of `url`. Text that is not an absolute URL is cut at
/// the first `/`, so `example.com/path` yields `example.com`.
pub fn get_domain(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return host.to_lowercase();
        }
    }
    url.split('/').next().unwrap_or_default().to_lowercase()
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// `true` for a dotted host made of letters, digits and hyphens only.
pub fn is_fully_qualified_domain(candidate: &str) -> bool {
    !candidate.is_empty() &&
        !candidate.contains("..") &&
        candidate.chars().all(|c| is_domain_char(c) || c == '.')
}

/// `true` for a dotted host in which some labels are a lone `*`.
pub fn is_fully_qualified_domain_wildcard(candidate: &str) -> bool {
    if !candidate.contains('*') {
        return false;
    }
    candidate.split('.').all(|label| {
        label == "*" || (!label.is_empty() && label.chars().all(is_domain_char))
    })
}

/// Compare labels right to left; a `*` label matches any single label. The
/// candidate needs at least as many labels as the wildcard, so
/// `*.example.com` does not match `example.com`.
pub fn fully_qualified_domain_matches_wildcard(wildcard: &str, candidate: &str) -> bool {
    let wildcard = wildcard.to_lowercase();
    let candidate = candidate.to_lowercase();
    let wildcard_labels: Vec<&str> = wildcard.split('.').collect();
    let candidate_labels: Vec<&str> = candidate.split('.').collect();
    if candidate_labels.len() < wildcard_labels.len() {
        return false;
    }
    wildcard_labels
        .iter()
        .rev()
        .zip(candidate_labels.iter().rev())
        .all(|(wildcard_label, candidate_label)| {
            *wildcard_label == "*" || wildcard_label == candidate_label
        })
}

fn is_regexp_template(template: &str) -> bool {
    template.len() > 2 && template.starts_with('/') && template.ends_with('/')
}

fn strip_protocol(url: &str) -> &str {
    match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    }
}

fn strip_www(url: &str) -> &str {
    url.strip_prefix("www.").unwrap_or(url)
}

fn escape_with_wildcards(text: &str, wildcard: &str) -> String {
    text.split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(wildcard)
}

/// Build the matcher for a non-regexp template. The host part accepts a
/// leading `*.` for any number of subdomains and `*` for a single label. A
/// path part matches as a prefix unless the template ends with `$`.
fn create_url_regex(template: &str) -> Option<Regex> {
    let template = template.trim();
    let exact_beginning = template.starts_with('^');
    let exact_ending = template.ends_with('$');
    let template = template.trim_start_matches('^').trim_end_matches('$');
    let template = strip_www(strip_protocol(template));

    let (host, path) = match template.find('/') {
        Some(idx) => (&template[..idx], Some(&template[idx..])),
        None => (template, None),
    };

    let mut pattern = String::from("(?i)^");
    if !exact_beginning {
        pattern.push_str(r"(?:www\.)?");
    }
    let host = match host.strip_prefix("*.") {
        Some(rest) => {
            pattern.push_str(r"(?:[^/?#]*\.)?");
            rest
        },
        None => host,
    };
    pattern.push_str(&escape_with_wildcards(host, r"[^./?#]+"));

    match path {
        Some(path) => {
            pattern.push_str(&escape_with_wildcards(path, ".*"));
            if !exact_ending {
                pattern.push_str(".*");
            }
        },
        None => pattern.push_str(r"(?:[:/?#].*)?"),
    }
    pattern.push('$');

    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Could not compile URL template {template}: {e}");
            None
        },
    }
}

fn compile_template(template: &str) -> Option<Regex> {
    if is_regexp_template(template) {
        let source = &template[1..template.len() - 1];
        return match Regex::new(source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Invalid regular expression in URL rule {template}: {e}");
                None
            },
        };
    }
    create_url_regex(template)
}

/// Generic matcher for a URL (or bare host) against a site-fix URL rule.
pub fn is_url_matched(url: &str, url_template: &str) -> bool {
    if url_template == "*" {
        return true;
    }
    let regex = {
        let mut cache = URL_TEMPLATE_CACHE.lock();
        if cache.len() >= URL_TEMPLATE_CACHE_LIMIT && !cache.contains_key(url_template) {
            debug!("Dropping {} compiled URL templates", cache.len());
            cache.clear();
        }
        cache
            .entry(url_template.to_owned())
            .or_insert_with(|| compile_template(url_template))
            .clone()
    };
    let Some(regex) = regex else {
        return false;
    };
    if is_regexp_template(url_template) {
        return regex.is_match(url);
    }
    regex.is_match(strip_protocol(url))
}

/// Match `domain` against the host part of a rule only, so a rule with a
/// path still applies to its host. Regular expression rules have no host
/// part.
pub(crate) fn is_rule_host_matched(domain: &str, url_template: &str) -> bool {
    if is_regexp_template(url_template) {
        return false;
    }
    let host = get_domain(url_template);
    !host.is_empty() && is_url_matched(domain, &host)
}

/// `true` if any rule of `list` matches `url`.
pub fn is_url_in_list(url: &str, list: &[String]) -> bool {
    list.iter().any(|template| is_url_matched(url, template))
}
