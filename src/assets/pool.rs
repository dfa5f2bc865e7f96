use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use eframe::egui::{ColorImage, Context};

use super::decode::decode_thumbnail;
use super::fetch::{AssetError, ThumbnailFetcher};

/// Shared flag marking one graph view as torn down.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub(super) struct LoadJob {
    pub(super) url: String,
    pub(super) generation: u64,
    pub(super) token: CancelToken,
    pub(super) results: Sender<LoadOutcome>,
    pub(super) repaint: Option<Context>,
}

pub(super) struct LoadOutcome {
    pub(super) url: String,
    pub(super) generation: u64,
    pub(super) result: Result<ColorImage, AssetError>,
}

/// Fixed set of loader threads. Jobs are resolved concurrently, in whatever
/// order the network finishes them.
pub(super) struct LoadPool {
    jobs: Sender<LoadJob>,
}

impl LoadPool {
    pub(super) fn new(worker_count: usize, fetcher: Arc<dyn ThumbnailFetcher>) -> Self {
        let (jobs, rx) = mpsc::channel::<LoadJob>();
        let rx = Arc::new(Mutex::new(rx));

        for index in 0..worker_count.max(1) {
            let rx = Arc::clone(&rx);
            let fetcher = Arc::clone(&fetcher);
            let spawned = thread::Builder::new()
                .name(format!("thumbnail-loader-{index}"))
                .spawn(move || worker_loop(&rx, fetcher.as_ref()));
            if let Err(error) = spawned {
                log::error!("failed to spawn thumbnail loader {index}: {error}");
            }
        }

        Self { jobs }
    }

    pub(super) fn submit(&self, job: LoadJob) {
        if self.jobs.send(job).is_err() {
            log::error!("thumbnail loader pool is gone; dropping load request");
        }
    }
}

fn worker_loop(jobs: &Mutex<Receiver<LoadJob>>, fetcher: &dyn ThumbnailFetcher) {
    loop {
        let job = {
            let Ok(guard) = jobs.lock() else {
                return;
            };
            match guard.recv() {
                Ok(job) => job,
                Err(_) => return,
            }
        };

        if job.token.is_cancelled() {
            log::debug!("skipping cancelled thumbnail load for {}", job.url);
            continue;
        }

        let result = fetcher
            .fetch(&job.url)
            .and_then(|bytes| decode_thumbnail(&job.url, &bytes));

        if job.token.is_cancelled() {
            log::debug!("discarding thumbnail for {} after cancellation", job.url);
            continue;
        }

        let delivered = job
            .results
            .send(LoadOutcome {
                url: job.url,
                generation: job.generation,
                result,
            })
            .is_ok();

        if delivered && let Some(ctx) = &job.repaint {
            ctx.request_repaint();
        }
    }
}
