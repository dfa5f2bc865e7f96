mod app;
mod assets;
mod graph;
mod util;

use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;

use app::{CommentGraphApp, LaunchOptions, RendererKind};
use assets::HttpFetcher;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload to open: a JSON file path or an http(s) URL.
    #[arg(long, default_value = "demos/sample_graph.json")]
    graph: String,

    /// Renderer to start with; overrides the remembered choice.
    #[arg(long, value_enum)]
    renderer: Option<RendererKind>,

    #[arg(long)]
    warmup_ticks: Option<u32>,

    #[arg(long)]
    cooldown_ms: Option<u64>,

    #[arg(long, allow_hyphen_values = true)]
    video_repulsion: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    user_repulsion: Option<f32>,

    /// Threads fetching and decoding thumbnails.
    #[arg(long, default_value_t = 4)]
    load_workers: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let fetcher = Arc::new(HttpFetcher::new().context("failed to build the thumbnail HTTP client")?);
    let load_workers = args.load_workers.max(1);
    let launch = LaunchOptions {
        graph: args.graph,
        renderer: args.renderer,
        warmup_ticks: args.warmup_ticks,
        cooldown_ms: args.cooldown_ms,
        video_repulsion: args.video_repulsion,
        user_repulsion: args.user_repulsion,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "comment-graph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(CommentGraphApp::new(
                cc,
                launch,
                fetcher,
                load_workers,
            )))
        }),
    )
    .map_err(|error| anyhow!("{error}"))
}
