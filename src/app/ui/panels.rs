use eframe::egui::{self, Align, Context, Layout};

use crate::assets::AssetCache;
use crate::graph::NodeType;

use super::super::ViewModel;
use super::super::render::RendererKind;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        assets: &mut AssetCache,
        renderer: &mut RendererKind,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("comment-graph");
                    ui.separator();
                    ui.label(format!("source: {}", self.source));
                    ui.label(format!(
                        "nodes: {} ({} videos, {} users)",
                        self.payload.nodes.len(),
                        self.payload.count_by_type(NodeType::Video),
                        self.payload.count_by_type(NodeType::User),
                    ));
                    ui.label(format!("edges: {}", self.simulation.edges().len()));
                    ui.label(format!("views: {}", self.total_views));

                    ui.separator();
                    for kind in [RendererKind::Planar, RendererKind::Volumetric] {
                        ui.selectable_value(renderer, kind, kind.label())
                            .on_hover_text("Switch between the flat and the orbiting view.");
                    }

                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let (resolved, requested) = assets.progress();
                        let stats = assets.stats();
                        ui.label(format!("thumbnails: {resolved}/{requested}"))
                            .on_hover_text(format!(
                                "queued: {}\ndispatched: {}\ncommitted: {}\nfailed: {}\ndiscarded: {}",
                                self.preloader.remaining(),
                                stats.dispatched,
                                stats.committed,
                                stats.failed,
                                stats.discarded,
                            ));
                        ui.label(format!("layout: {}", self.simulation.phase().label()));
                    });
                });
            });

        if *renderer != self.renderer.kind() {
            self.switch_renderer(*renderer, assets);
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("details_scroll")
                    .show(ui, |ui| self.draw_details(ui, assets));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui, assets));
    }
}
