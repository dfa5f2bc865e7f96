use std::collections::{HashSet, VecDeque};

use super::{AssetCache, CancelToken};

/// Queue of thumbnails a view wants loaded, dispatched a few per frame so
/// a large graph does not flood the loader pool in one go.
pub struct Preloader {
    queue: VecDeque<String>,
    token: CancelToken,
    dispatched: usize,
}

impl Preloader {
    pub fn new<I, S>(urls: I, token: CancelToken) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let queue = urls
            .into_iter()
            .map(Into::into)
            .filter(|url: &String| seen.insert(url.clone()))
            .collect::<VecDeque<_>>();

        Self {
            queue,
            token,
            dispatched: 0,
        }
    }

    /// Requests up to `budget` queued URLs. Stops for good once the view's
    /// token has been cancelled.
    pub fn pump(&mut self, cache: &mut AssetCache, budget: usize) -> usize {
        let mut sent = 0;
        while sent < budget {
            if self.token.is_cancelled() {
                if !self.queue.is_empty() {
                    log::debug!("preloader cancelled with {} urls queued", self.queue.len());
                    self.queue.clear();
                }
                break;
            }
            let Some(url) = self.queue.pop_front() else {
                break;
            };
            cache.request(&url);
            sent += 1;
        }

        self.dispatched += sent;
        sent
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}
