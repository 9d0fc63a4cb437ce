/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::{fs, io};

use dark_theme::{CssFetcher, FetchError};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use log::debug;
use url::Url;

/// Serves `file:` URLs from the local file system.
#[derive(Debug, Default)]
pub(crate) struct FileFetcher;

pub(crate) fn read_file_url(url: &Url) -> Result<Vec<u8>, FetchError> {
    let path = url.to_file_path().map_err(|()| FetchError::Failed {
        url: url.clone(),
        reason: "only file URLs can be read".to_owned(),
    })?;
    debug!("Reading {}", path.display());
    fs::read(&path).map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => FetchError::NotFound(url.clone()),
        _ => FetchError::Failed {
            url: url.clone(),
            reason: error.to_string(),
        },
    })
}

impl CssFetcher for FileFetcher {
    fn fetch_css<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, FetchError>> {
        async move {
            let bytes = read_file_url(url)?;
            String::from_utf8(bytes).map_err(|error| FetchError::Failed {
                url: url.clone(),
                reason: error.to_string(),
            })
        }
        .boxed_local()
    }
}
