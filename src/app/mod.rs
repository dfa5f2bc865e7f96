use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context};

use crate::assets::{AssetCache, Preloader, ThumbnailFetcher};
use crate::graph::{GraphPayload, load_payload};

mod graph;
mod highlight;
mod physics;
mod render;
mod render_utils;
mod ui;

use graph::InteractionController;
use physics::{ForceSimulation, SimulationConfig};
use render::Renderer;

pub use render::RendererKind;

const RENDERER_STORAGE_KEY: &str = "renderer";

/// Startup settings collected from the command line.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub graph: String,
    pub renderer: Option<RendererKind>,
    pub warmup_ticks: Option<u32>,
    pub cooldown_ms: Option<u64>,
    pub video_repulsion: Option<f32>,
    pub user_repulsion: Option<f32>,
}

impl LaunchOptions {
    fn simulation_config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        if let Some(ticks) = self.warmup_ticks {
            config.warmup_ticks = ticks;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            config.cooldown = Duration::from_millis(cooldown_ms);
        }
        if let Some(strength) = self.video_repulsion {
            config.video_repulsion = strength;
        }
        if let Some(strength) = self.user_repulsion {
            config.user_repulsion = strength;
        }
        config
    }
}

pub struct CommentGraphApp {
    options: LaunchOptions,
    renderer: RendererKind,
    assets: AssetCache,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphPayload, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphPayload, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// One graph view: the payload plus everything that lives and dies with it.
struct ViewModel {
    source: String,
    payload: GraphPayload,
    renderer: Box<dyn Renderer>,
    simulation: ForceSimulation,
    interaction: InteractionController,
    preloader: Preloader,
    config: SimulationConfig,
    started: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    total_views: u64,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<usize>>,
}

impl CommentGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        options: LaunchOptions,
        fetcher: Arc<dyn ThumbnailFetcher>,
        load_workers: usize,
    ) -> Self {
        let stored = cc
            .storage
            .and_then(|storage| eframe::get_value::<RendererKind>(storage, RENDERER_STORAGE_KEY));
        let renderer = options.renderer.or(stored).unwrap_or_default();
        log::info!("starting with the {} renderer", renderer.label());

        let mut assets = AssetCache::new(fetcher, load_workers);
        assets.set_repaint_context(cc.egui_ctx.clone());

        let state = Self::start_load(options.graph.clone());
        Self {
            options,
            renderer,
            assets,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: String) -> Receiver<Result<GraphPayload, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_payload(&source).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                log::error!("{error}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: String) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&mut self, payload: GraphPayload) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            self.options.graph.clone(),
            payload,
            self.renderer,
            self.options.simulation_config(),
            &mut self.assets,
        )))
    }
}

impl eframe::App for CommentGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint_after(Duration::from_millis(50)),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading comment graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load comment graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    &mut self.assets,
                    &mut self.renderer,
                    &mut reload_requested,
                    is_reloading,
                );

                if reload_requested && self.reload_rx.is_none() {
                    log::info!("reloading {}", self.options.graph);
                    self.reload_rx = Some(Self::spawn_load(self.options.graph.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint_after(Duration::from_millis(50));
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.options.graph.clone());
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            if matches!(self.state, AppState::Ready(_)) {
                self.assets.end_view();
            }
            self.state = match result {
                Ok(payload) => self.ready(payload),
                Err(error) => AppState::Error(error),
            };
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, RENDERER_STORAGE_KEY, &self.renderer);
    }
}
