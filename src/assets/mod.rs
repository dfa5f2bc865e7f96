//! Thumbnail loading shared by both renderers.
//!
//! Every URL has at most one load in flight. Loads run on a small worker pool
//! and report back through a channel that the UI thread drains once per frame
//! with [`AssetCache::poll`]. Each graph view gets its own generation; results
//! that belong to an older generation are dropped instead of committed.

mod decode;
mod fetch;
mod pool;
mod preload;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use eframe::egui::{ColorImage, Context, TextureHandle, TextureOptions};

pub use fetch::{AssetError, HttpFetcher, ThumbnailFetcher};
pub use pool::CancelToken;
pub use preload::Preloader;

use decode::fallback_icon;
use pool::{LoadJob, LoadOutcome, LoadPool};

enum AssetEntry {
    Pending { generation: u64 },
    Ready(Arc<ColorImage>),
    Fallback,
}

/// A resolved thumbnail. Failed loads resolve to the bundled icon.
#[derive(Clone)]
pub struct Drawable {
    pub image: Arc<ColorImage>,
    pub is_fallback: bool,
}

pub enum AssetLookup {
    Ready(Drawable),
    Pending,
    Absent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetHandle {
    pub url: String,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetStats {
    pub dispatched: usize,
    pub committed: usize,
    pub failed: usize,
    pub discarded: usize,
}

pub struct AssetCache {
    entries: HashMap<String, AssetEntry>,
    view_urls: HashSet<String>,
    generation: u64,
    token: CancelToken,
    pool: LoadPool,
    results_tx: Sender<LoadOutcome>,
    results_rx: Receiver<LoadOutcome>,
    fallback: Arc<ColorImage>,
    textures: HashMap<String, TextureHandle>,
    fallback_texture: Option<TextureHandle>,
    repaint: Option<Context>,
    stats: AssetStats,
}

impl AssetCache {
    pub fn new(fetcher: Arc<dyn ThumbnailFetcher>, worker_count: usize) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            entries: HashMap::new(),
            view_urls: HashSet::new(),
            generation: 0,
            token: CancelToken::new(),
            pool: LoadPool::new(worker_count, fetcher),
            results_tx,
            results_rx,
            fallback: Arc::new(fallback_icon()),
            textures: HashMap::new(),
            fallback_texture: None,
            repaint: None,
            stats: AssetStats::default(),
        }
    }

    /// Wakes the UI whenever a worker reports a finished load.
    pub fn set_repaint_context(&mut self, ctx: Context) {
        self.repaint = Some(ctx);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> AssetStats {
        self.stats
    }

    /// Tears down the previous view: cancels its in-flight loads, forgets
    /// its pending entries and starts a new generation. Resolved images stay.
    pub fn begin_view(&mut self) -> CancelToken {
        self.end_view();
        self.token = CancelToken::new();
        self.token.clone()
    }

    /// Cancels the current view's loads. Anything still in flight is
    /// discarded when it reports back.
    pub fn end_view(&mut self) {
        self.token.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.view_urls.clear();

        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !matches!(entry, AssetEntry::Pending { .. }));
        let abandoned = before - self.entries.len();
        if abandoned > 0 {
            log::info!(
                "abandoned {abandoned} in-flight thumbnail loads for view generation {}",
                self.generation
            );
        }
    }

    pub fn request(&mut self, url: &str) -> AssetHandle {
        self.view_urls.insert(url.to_owned());

        if !self.entries.contains_key(url) {
            self.entries.insert(
                url.to_owned(),
                AssetEntry::Pending {
                    generation: self.generation,
                },
            );
            self.stats.dispatched += 1;
            self.pool.submit(LoadJob {
                url: url.to_owned(),
                generation: self.generation,
                token: self.token.clone(),
                results: self.results_tx.clone(),
                repaint: self.repaint.clone(),
            });
        }

        AssetHandle {
            url: url.to_owned(),
            generation: self.generation,
        }
    }

    pub fn get(&self, url: &str) -> AssetLookup {
        match self.entries.get(url) {
            Some(AssetEntry::Ready(image)) => AssetLookup::Ready(Drawable {
                image: Arc::clone(image),
                is_fallback: false,
            }),
            Some(AssetEntry::Fallback) => AssetLookup::Ready(Drawable {
                image: Arc::clone(&self.fallback),
                is_fallback: true,
            }),
            Some(AssetEntry::Pending { .. }) => AssetLookup::Pending,
            None => AssetLookup::Absent,
        }
    }

    pub fn is_resolved(&self, url: &str) -> bool {
        matches!(
            self.entries.get(url),
            Some(AssetEntry::Ready(_) | AssetEntry::Fallback)
        )
    }

    pub fn all_resolved<'a>(&self, mut urls: impl Iterator<Item = &'a str>) -> bool {
        urls.all(|url| self.is_resolved(url))
    }

    /// `(resolved, requested)` for the current view.
    pub fn progress(&self) -> (usize, usize) {
        let resolved = self
            .view_urls
            .iter()
            .filter(|url| self.is_resolved(url))
            .count();
        (resolved, self.view_urls.len())
    }

    /// Commits finished loads. Returns how many entries changed.
    pub fn poll(&mut self) -> usize {
        let mut committed = 0;
        loop {
            let outcome = match self.results_rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };

            if self.commit(outcome) {
                committed += 1;
            }
        }

        if committed > 0 {
            log::debug!("committed {committed} thumbnails");
        }
        committed
    }

    fn commit(&mut self, outcome: LoadOutcome) -> bool {
        let is_current = outcome.generation == self.generation
            && matches!(
                self.entries.get(&outcome.url),
                Some(AssetEntry::Pending { generation }) if *generation == outcome.generation
            );
        if !is_current {
            self.stats.discarded += 1;
            log::debug!(
                "discarding stale thumbnail {} from generation {}",
                outcome.url,
                outcome.generation
            );
            return false;
        }

        let entry = match outcome.result {
            Ok(image) => AssetEntry::Ready(Arc::new(image)),
            Err(error) => {
                self.stats.failed += 1;
                log::warn!("thumbnail load failed, using default icon: {error:#}");
                AssetEntry::Fallback
            }
        };
        self.entries.insert(outcome.url, entry);
        self.stats.committed += 1;
        true
    }

    /// GPU texture for a resolved URL, uploaded on first use.
    pub fn texture(&mut self, ctx: &Context, url: &str) -> Option<TextureHandle> {
        match self.entries.get(url)? {
            AssetEntry::Pending { .. } => None,
            AssetEntry::Fallback => Some(self.fallback_texture(ctx)),
            AssetEntry::Ready(image) => {
                if let Some(texture) = self.textures.get(url) {
                    return Some(texture.clone());
                }
                let texture = ctx.load_texture(
                    format!("thumbnail:{url}"),
                    ColorImage::clone(image),
                    TextureOptions::LINEAR,
                );
                self.textures.insert(url.to_owned(), texture.clone());
                Some(texture)
            }
        }
    }

    pub fn fallback_texture(&mut self, ctx: &Context) -> TextureHandle {
        self.fallback_texture
            .get_or_insert_with(|| {
                ctx.load_texture(
                    "thumbnail:default-icon",
                    ColorImage::clone(&self.fallback),
                    TextureOptions::LINEAR,
                )
            })
            .clone()
    }
}

impl Drop for AssetCache {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{Receiver, Sender};
    use std::time::Duration;

    use super::decode::DEFAULT_ICON_PNG;
    use super::*;

    /// Serves the bundled icon bytes, or fails for URLs containing "broken".
    /// With a gate installed, every fetch waits for one message first.
    #[derive(Default)]
    pub struct FakeFetcher {
        pub calls: AtomicUsize,
        pub finished: AtomicUsize,
        gate: Option<Mutex<Receiver<()>>>,
    }

    impl FakeFetcher {
        pub fn gated() -> (Self, Sender<()>) {
            let (tx, rx) = std::sync::mpsc::channel();
            let fetcher = Self {
                gate: Some(Mutex::new(rx)),
                ..Self::default()
            };
            (fetcher, tx)
        }
    }

    impl ThumbnailFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let guard = gate.lock().expect("gate lock");
                let _ = guard.recv_timeout(Duration::from_secs(5));
            }

            let result = if url.contains("broken") {
                Err(AssetError::Status {
                    url: url.to_owned(),
                    status: 404,
                })
            } else {
                Ok(DEFAULT_ICON_PNG.to_vec())
            };
            self.finished.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    pub fn wait_until(cache: &mut AssetCache, mut done: impl FnMut(&AssetCache) -> bool) {
        for _ in 0..400 {
            cache.poll();
            if done(cache) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("asset cache did not settle in time");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::testing::{FakeFetcher, wait_until};
    use super::*;

    #[test]
    fn concurrent_requests_share_one_load() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut cache = AssetCache::new(fetcher.clone(), 4);

        let handles = (0..8)
            .map(|_| cache.request("https://img/a.jpg"))
            .collect::<Vec<_>>();
        assert!(handles.windows(2).all(|pair| pair[0] == pair[1]));

        wait_until(&mut cache, |cache| cache.is_resolved("https://img/a.jpg"));

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().dispatched, 1);

        let first = match cache.get("https://img/a.jpg") {
            AssetLookup::Ready(drawable) => drawable,
            _ => panic!("expected a ready thumbnail"),
        };
        let second = match cache.get("https://img/a.jpg") {
            AssetLookup::Ready(drawable) => drawable,
            _ => panic!("expected a ready thumbnail"),
        };
        assert!(Arc::ptr_eq(&first.image, &second.image));
        assert!(!first.is_fallback);
    }

    #[test]
    fn ending_a_view_drops_its_in_flight_loads() {
        let (fetcher, gate) = FakeFetcher::gated();
        let fetcher = Arc::new(fetcher);
        let mut cache = AssetCache::new(fetcher.clone(), 1);
        let token = cache.begin_view();
        cache.request("https://img/slow.jpg");
        let generation = cache.generation();

        cache.end_view();
        assert!(token.is_cancelled());
        assert_eq!(cache.generation(), generation + 1);
        assert!(matches!(cache.get("https://img/slow.jpg"), AssetLookup::Absent));

        let _ = gate.send(());
        for _ in 0..100 {
            cache.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.stats().committed, 0);
        assert!(matches!(cache.get("https://img/slow.jpg"), AssetLookup::Absent));
    }

    #[test]
    fn failed_load_resolves_to_the_fallback_icon() {
        let mut cache = AssetCache::new(Arc::new(FakeFetcher::default()), 2);
        cache.request("https://img/broken.jpg");

        wait_until(&mut cache, |cache| cache.is_resolved("https://img/broken.jpg"));

        match cache.get("https://img/broken.jpg") {
            AssetLookup::Ready(drawable) => assert!(drawable.is_fallback),
            _ => panic!("failure must resolve to the fallback"),
        }
        assert_eq!(cache.stats().failed, 1);
        assert_eq!(cache.progress(), (1, 1));
    }

    #[test]
    fn unknown_urls_are_absent_until_requested() {
        let (fetcher, _gate) = FakeFetcher::gated();
        let mut cache = AssetCache::new(Arc::new(fetcher), 1);

        assert!(matches!(cache.get("https://img/x.jpg"), AssetLookup::Absent));
        cache.request("https://img/x.jpg");
        assert!(matches!(cache.get("https://img/x.jpg"), AssetLookup::Pending));
    }

    #[test]
    fn loads_from_a_torn_down_view_are_never_committed() {
        let (fetcher, gate) = FakeFetcher::gated();
        let fetcher = Arc::new(fetcher);
        let mut cache = AssetCache::new(fetcher.clone(), 1);

        cache.request("https://img/slow.jpg");
        while fetcher.calls.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }

        cache.begin_view();
        assert!(matches!(cache.get("https://img/slow.jpg"), AssetLookup::Absent));

        gate.send(()).expect("release fetch");
        while fetcher.finished.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(20));
        cache.poll();

        assert!(matches!(cache.get("https://img/slow.jpg"), AssetLookup::Absent));
        assert_eq!(cache.stats().committed, 0);
    }

    #[test]
    fn stale_generation_results_are_discarded_on_commit() {
        let (fetcher, _gate) = FakeFetcher::gated();
        let mut cache = AssetCache::new(Arc::new(fetcher), 1);
        let old_generation = cache.generation();
        cache.begin_view();
        cache.request("https://img/reused.jpg");

        cache
            .results_tx
            .send(LoadOutcome {
                url: "https://img/reused.jpg".to_owned(),
                generation: old_generation,
                result: Ok(fallback_icon()),
            })
            .expect("inject outcome");

        assert_eq!(cache.poll(), 0);
        assert_eq!(cache.stats().discarded, 1);
        assert!(matches!(cache.get("https://img/reused.jpg"), AssetLookup::Pending));
    }

    #[test]
    fn resolved_images_survive_a_new_view() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut cache = AssetCache::new(fetcher.clone(), 1);
        cache.request("https://img/keep.jpg");
        wait_until(&mut cache, |cache| cache.is_resolved("https://img/keep.jpg"));

        cache.begin_view();
        cache.request("https://img/keep.jpg");

        assert!(cache.is_resolved("https://img/keep.jpg"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.progress(), (1, 1));
    }
}
