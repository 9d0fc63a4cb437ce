/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Compact index over the site-fix configuration text.
//!
//! Indexing only records where each record lives in the text and which
//! domains it mentions:
//!
//! * exact domains go to `domains`,
//! * wildcard domains go to `domain_labels` under their most selective label
//!   (the label shared by the fewest records), which is only a coarse filter
//!   and is re-verified on lookup,
//! * anything else goes to `nonstandard` and is matched by a linear scan.
//!
//! Records are parsed on demand. Parsed records and per-host results are kept
//! until the index has been idle for [`INDEX_CACHE_CLEANUP_INTERVAL`].

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cleanup::{CleanupScheduler, INDEX_CACHE_CLEANUP_INTERVAL, TokioCleanupScheduler};
use crate::offsets::{decode_offset, encode_offsets, record_count};
use crate::parse::{RECORD_DELIMITER, SiteProps, command_line_indices, parse_record};
use crate::text::parse_array;
use crate::url::{
    clear_url_template_cache, fully_qualified_domain_matches_wildcard, get_domain,
    is_fully_qualified_domain, is_fully_qualified_domain_wildcard, is_rule_host_matched,
    is_url_matched,
};

/// Position of a record in the index that produced it. Ids from one index
/// mean nothing to another.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RecordId(usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, PartialEq)]
pub enum IndexError {
    /// A record does not fit in the fixed-width offsets table.
    RecordOutOfRange { start: usize, length: usize },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::RecordOutOfRange { start, length } => write!(
                f,
                "site fix record at offset {start} with length {length} does not fit the offsets table"
            ),
        }
    }
}

impl std::error::Error for IndexError {}

pub(crate) type IdList = FxHashMap<String, Vec<RecordId>>;

/// The domain part shared by fixes and site lists.
#[derive(Debug, Default)]
pub(crate) struct ConfigIndex {
    pub(crate) domains: IdList,
    pub(crate) domain_labels: IdList,
    pub(crate) nonstandard: Vec<RecordId>,
}

fn add_label(set: &mut IdList, label: &str, id: RecordId) {
    let ids = set.entry(label.to_owned()).or_default();
    if !ids.contains(&id) {
        ids.push(id);
    }
}

/// Candidate labels of a wildcard domain: every label that is not `*`.
/// A bare `*` wildcard is indexed under `"*"`.
fn extract_domain_labels_from_wildcard(wildcard: &str) -> Vec<String> {
    let labels: Vec<String> = wildcard
        .split('.')
        .filter(|label| *label != "*" && !label.is_empty())
        .map(String::from)
        .collect();
    if labels.is_empty() {
        return vec!["*".to_owned()];
    }
    labels
}

pub(crate) fn index_config_urls(urls: &[Vec<String>]) -> ConfigIndex {
    let mut index = ConfigIndex::default();
    let mut label_frequencies: FxHashMap<String, usize> = FxHashMap::default();
    let mut wildcard_members: Vec<(Vec<String>, RecordId)> = Vec::new();

    for (idx, block) in urls.iter().enumerate() {
        let id = RecordId(idx);
        let mut block_labels: FxHashSet<String> = FxHashSet::default();
        for url in block {
            let domain = get_domain(url);
            if is_fully_qualified_domain(&domain) {
                add_label(&mut index.domains, &domain, id);
            } else if is_fully_qualified_domain_wildcard(&domain) {
                let labels = extract_domain_labels_from_wildcard(&domain);
                block_labels.extend(labels.iter().cloned());
                wildcard_members.push((labels, id));
            } else {
                // One entry is enough, the whole record gets scanned.
                index.nonstandard.push(id);
                break;
            }
        }
        for label in block_labels {
            *label_frequencies.entry(label).or_insert(0) += 1;
        }
    }

    let frequency = |label: &String| label_frequencies.get(label).copied().unwrap_or(0);
    for (labels, id) in wildcard_members {
        // `min_by_key` keeps the first of equally rare labels.
        if let Some(label) = labels.iter().min_by_key(|label| frequency(*label)) {
            add_label(&mut index.domain_labels, label, id);
        }
    }

    index
}

fn lookup_config_urls_in_domain_labels(
    domain: &str,
    record_ids: &mut Vec<RecordId>,
    candidates: &[RecordId],
    get_record_urls: &mut impl FnMut(RecordId) -> Vec<String>,
) {
    for &id in candidates {
        for rule_url in get_record_urls(id) {
            let wildcard = get_domain(&rule_url);
            if is_fully_qualified_domain_wildcard(&wildcard) &&
                fully_qualified_domain_matches_wildcard(&wildcard, domain)
            {
                record_ids.push(id);
            }
        }
    }
}

/// Ids of every record whose URL rules match `domain`, without duplicates.
pub(crate) fn lookup_config_urls(
    domain: &str,
    index: &ConfigIndex,
    mut get_record_urls: impl FnMut(RecordId) -> Vec<String>,
) -> Vec<RecordId> {
    let labels: Vec<&str> = domain.split('.').collect();
    let mut record_ids: Vec<RecordId> = Vec::new();

    if let Some(ids) = index.domain_labels.get("*") {
        record_ids.extend_from_slice(ids);
    }

    for label in &labels {
        if let Some(candidates) = index.domain_labels.get(*label) {
            lookup_config_urls_in_domain_labels(
                domain,
                &mut record_ids,
                candidates,
                &mut get_record_urls,
            );
        }
    }

    for start in 0..labels.len() {
        let suffix = labels[start..].join(".");
        if let Some(ids) = index.domains.get(&suffix) {
            record_ids.extend_from_slice(ids);
        }
        if let Some(candidates) = index.domain_labels.get(&suffix) {
            lookup_config_urls_in_domain_labels(
                domain,
                &mut record_ids,
                candidates,
                &mut get_record_urls,
            );
        }
    }

    for &id in &index.nonstandard {
        if get_record_urls(id)
            .iter()
            .any(|url| is_url_matched(domain, url) || is_rule_host_matched(domain, url))
        {
            record_ids.push(id);
        }
    }

    let mut seen = FxHashSet::default();
    record_ids.retain(|id| seen.insert(*id));
    record_ids
}

/// Walk the text record by record, keeping the byte range and URL rules of
/// every record that has at least one command.
fn extract_urls_from_site_fixes_config(text: &str) -> (Vec<Vec<String>>, Vec<(usize, usize)>) {
    let mut urls = Vec::new();
    let mut offsets = Vec::new();

    let mut process_block = |start: usize, end: usize| {
        let block = &text[start..end];
        let lines: Vec<&str> = block.split('\n').collect();
        let Some(&first_command) = command_line_indices(&lines).first() else {
            return;
        };
        offsets.push((start, end - start));
        urls.push(parse_array(&lines[..first_command].join("\n")));
    };

    let mut record_start = 0;
    for delimiter in RECORD_DELIMITER.find_iter(text) {
        process_block(record_start, delimiter.start());
        record_start = delimiter.end();
    }
    process_block(record_start, text.len());

    (urls, offsets)
}

struct IndexCaches<T> {
    site_fix: FxHashMap<RecordId, Arc<T>>,
    domain_index: FxHashMap<String, Vec<RecordId>>,
}

impl<T> Default for IndexCaches<T> {
    fn default() -> Self {
        Self {
            site_fix: FxHashMap::default(),
            domain_index: FxHashMap::default(),
        }
    }
}

impl<T> IndexCaches<T> {
    fn clear(&mut self) {
        self.site_fix.clear();
        self.domain_index.clear();
    }
}

/// Lazily parsed index over one configuration text.
pub struct SitePropsIndex<T> {
    text: Arc<str>,
    offsets: String,
    index: ConfigIndex,
    caches: Arc<Mutex<IndexCaches<T>>>,
    cleanup: Mutex<Box<dyn CleanupScheduler>>,
}

/// Index `text` with idle cleanup running on the ambient tokio runtime.
pub fn index_sites_fixes_config<T>(text: &str) -> Result<SitePropsIndex<T>, IndexError>
where
    T: SiteProps + Send + Sync + 'static,
{
    SitePropsIndex::with_scheduler(text, Box::new(TokioCleanupScheduler::default()))
}

impl<T> SitePropsIndex<T>
where
    T: SiteProps + Send + Sync + 'static,
{
    pub fn with_scheduler(
        text: &str,
        cleanup: Box<dyn CleanupScheduler>,
    ) -> Result<Self, IndexError> {
        let (urls, offsets) = extract_urls_from_site_fixes_config(text);
        let index = index_config_urls(&urls);
        let offsets = encode_offsets(&offsets)?;
        debug!(
            "Indexed {} site fix records ({} domains, {} labels, {} nonstandard)",
            record_count(&offsets),
            index.domains.len(),
            index.domain_labels.len(),
            index.nonstandard.len()
        );
        Ok(Self {
            text: Arc::from(text),
            offsets,
            index,
            caches: Arc::new(Mutex::new(IndexCaches::default())),
            cleanup: Mutex::new(cleanup),
        })
    }

    /// All records that apply to `url`, in no particular order.
    pub fn get_sites_fixes_for(&self, url: &str) -> Vec<Arc<T>> {
        let domain = get_domain(url);
        let records = {
            let mut caches = self.caches.lock();
            let cached = caches.domain_index.get(&domain).cloned();
            let record_ids = match cached {
                Some(ids) => ids,
                None => {
                    let ids = lookup_config_urls(&domain, &self.index, |id| {
                        self.site_fix(&mut caches, id)
                            .map(|fix| fix.urls().to_vec())
                            .unwrap_or_default()
                    });
                    caches.domain_index.insert(domain, ids.clone());
                    ids
                },
            };
            record_ids
                .into_iter()
                .filter_map(|id| self.site_fix(&mut caches, id))
                .collect()
        };
        self.schedule_cache_cleanup();
        records
    }

    fn site_fix(&self, caches: &mut IndexCaches<T>, id: RecordId) -> Option<Arc<T>> {
        if let Some(fix) = caches.site_fix.get(&id) {
            return Some(fix.clone());
        }
        let Some((start, end)) = decode_offset(&self.offsets, id.0) else {
            warn!("Site fix record {} is missing from the offsets table", id.0);
            return None;
        };
        let fix = Arc::new(parse_record::<T>(self.text.get(start..end)?)?);
        caches.site_fix.insert(id, fix.clone());
        Some(fix)
    }

    fn schedule_cache_cleanup(&self) {
        let caches = Arc::downgrade(&self.caches);
        self.cleanup.lock().reschedule(
            INDEX_CACHE_CLEANUP_INTERVAL,
            Box::new(move || {
                if let Some(caches) = caches.upgrade() {
                    debug!("Dropping idle site fix caches");
                    caches.lock().clear();
                    clear_url_template_cache();
                }
            }),
        );
    }
}

impl<T> SitePropsIndex<T> {
    /// The encoded offsets table.
    pub fn offsets(&self) -> &str {
        &self.offsets
    }

    pub fn record_count(&self) -> usize {
        record_count(&self.offsets)
    }

    /// Records indexed under the exact domain `domain`.
    pub fn domain_records(&self, domain: &str) -> &[RecordId] {
        self.index.domains.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records indexed under the wildcard label `label`.
    pub fn label_records(&self, label: &str) -> &[RecordId] {
        self.index.domain_labels.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nonstandard_records(&self) -> &[RecordId] {
        &self.index.nonstandard
    }

    /// Number of parsed records currently held.
    pub fn cached_site_fix_count(&self) -> usize {
        self.caches.lock().site_fix.len()
    }

    /// Number of host lookups currently memoized.
    pub fn cached_domain_count(&self) -> usize {
        self.caches.lock().domain_index.len()
    }

    pub fn has_pending_cleanup(&self) -> bool {
        self.cleanup.lock().is_scheduled()
    }

    /// Drop every cached record and host result now.
    pub fn clear_caches(&self) {
        self.cleanup.lock().cancel();
        self.caches.lock().clear();
        clear_url_template_cache();
    }
}
