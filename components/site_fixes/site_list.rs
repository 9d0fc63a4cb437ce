/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Flat URL lists (for example sites that are already dark) indexed the same
//! way as site fixes, one URL per record.

use crate::index::{ConfigIndex, index_config_urls, lookup_config_urls};
use crate::text::parse_array;
use crate::url::{get_domain, is_url_in_list};

#[derive(Debug)]
pub struct SiteListIndex {
    urls: Vec<String>,
    index: ConfigIndex,
}

impl SiteListIndex {
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// The list entries whose domain part matches the host of `url`.
    pub fn get_site_list_for(&self, url: &str) -> Vec<&str> {
        let domain = get_domain(url);
        lookup_config_urls(&domain, &self.index, |id| vec![self.urls[id.index()].clone()])
            .into_iter()
            .map(|id| self.urls[id.index()].as_str())
            .collect()
    }
}

pub fn index_site_list_config(text: &str) -> SiteListIndex {
    let urls = parse_array(text);
    let blocks: Vec<Vec<String>> = urls.iter().map(|url| vec![url.clone()]).collect();
    let index = index_config_urls(&blocks);
    SiteListIndex { urls, index }
}

/// `true` if `url` is covered by the list. A missing list covers nothing.
pub fn is_url_in_site_list(url: &str, index: Option<&SiteListIndex>) -> bool {
    let Some(index) = index else {
        return false;
    };
    let candidates: Vec<String> = index
        .get_site_list_for(url)
        .into_iter()
        .map(String::from)
        .collect();
    is_url_in_list(url, &candidates)
}
