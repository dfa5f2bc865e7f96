use std::time::Instant;

use eframe::egui::{self, Ui};

use crate::assets::AssetCache;

use super::super::ViewModel;
use super::super::highlight::build_highlight;
use super::super::render::{RenderEvent, Scene};

/// Thumbnail requests dispatched per frame.
const PRELOAD_BUDGET: usize = 8;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, assets: &mut AssetCache) {
        self.interaction.flush_deferred(&mut self.simulation);
        assets.poll();
        let sent = self.preloader.pump(assets, PRELOAD_BUDGET);
        if sent > 0 && self.preloader.is_done() {
            log::debug!("all {} thumbnails requested", self.preloader.dispatched());
        }

        if !self.start_if_ready(assets) {
            self.draw_thumbnail_gate(ui, assets);
            return;
        }

        let moving = self.simulation.advance(Instant::now());
        let search_matches = self.search_matches();
        let highlight = build_highlight(self.interaction.selection(), self.simulation.edges());

        let scene = Scene {
            nodes: &self.payload.nodes,
            positions: self.simulation.positions(),
            edges: self.simulation.edges(),
            selection: self.interaction.selection(),
            highlight: highlight.as_ref(),
            search_matches: search_matches.as_deref(),
        };
        let response = self.renderer.paint(ui, &scene, assets);

        for event in response.events {
            self.apply_render_event(event);
        }

        let (resolved, requested) = assets.progress();
        if moving
            || response.interacting
            || self.interaction.has_deferred()
            || self.interaction.dragging().is_some()
            || !self.preloader.is_done()
            || resolved < requested
        {
            ui.ctx().request_repaint();
        }
    }

    fn draw_thumbnail_gate(&self, ui: &mut Ui, assets: &AssetCache) {
        let total = self.payload.thumbnail_urls().count();
        let resolved = self
            .payload
            .thumbnail_urls()
            .filter(|url| assets.is_resolved(url))
            .count();

        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading("Loading images...");
            ui.add_space(8.0);
            ui.add(
                egui::ProgressBar::new(resolved as f32 / total.max(1) as f32)
                    .desired_width(280.0)
                    .text(format!("{resolved} / {total}")),
            );
        });
        ui.ctx().request_repaint();
    }

    fn apply_render_event(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::NodeActivated(index) => self.activate_node(index),
            RenderEvent::EdgeActivated(index) => self.activate_edge(index),
            RenderEvent::DragStarted { index, position } => {
                self.interaction
                    .on_drag_start(&mut self.simulation, index, position);
            }
            RenderEvent::DragMoved { position } => {
                self.interaction.on_drag_move(&mut self.simulation, position);
            }
            RenderEvent::DragEnded => self.interaction.on_drag_end(&mut self.simulation),
        }
    }
}
