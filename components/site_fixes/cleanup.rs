/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debounced idle eviction of the lazily filled index caches.

use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Quiet period after the last lookup before the caches are dropped.
pub const INDEX_CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub type CleanupTask = Box<dyn FnOnce() + Send + 'static>;

/// Owner of the single outstanding cleanup task of an index.
///
/// `reschedule` replaces any armed task, so a burst of lookups results in one
/// cleanup, `delay` after the last of them.
pub trait CleanupScheduler: Send {
    fn reschedule(&mut self, delay: Duration, task: CleanupTask);
    fn cancel(&mut self);
    fn is_scheduled(&self) -> bool;
}

/// Runs the cleanup on the ambient tokio runtime. Without a runtime nothing
/// is scheduled and the caches simply live as long as the index.
#[derive(Debug, Default)]
pub struct TokioCleanupScheduler {
    handle: Option<JoinHandle<()>>,
}

impl CleanupScheduler for TokioCleanupScheduler {
    fn reschedule(&mut self, delay: Duration, task: CleanupTask) {
        self.cancel();
        let Ok(runtime) = Handle::try_current() else {
            debug!("No tokio runtime, index cache cleanup is disabled");
            return;
        };
        self.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn is_scheduled(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TokioCleanupScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Never schedules anything. Used by tests so lookups stay deterministic.
#[derive(Debug, Default)]
pub struct NoopCleanupScheduler;

impl CleanupScheduler for NoopCleanupScheduler {
    fn reschedule(&mut self, _delay: Duration, _task: CleanupTask) {}

    fn cancel(&mut self) {}

    fn is_scheduled(&self) -> bool {
        false
    }
}
