use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, PointerButton, Pos2, Rect, Sense, Stroke, Ui, Vec2,
    pos2,
};
use glam::Vec3;

use crate::assets::AssetCache;
use crate::graph::NodeType;
use crate::util::truncate_label;

use super::super::render_utils::{
    circle_visible, dim_color, distance_to_segment, draw_background, edge_visible,
    gradient_segment, screen_to_world, selection_ring, textured_disc, with_alpha, world_to_screen,
};
use super::{
    EDGE_COLOR, NEIGHBOR_COLOR, NodeEmphasis, PlanarDetail, RenderEvent, RenderResponse, Renderer,
    RendererKind, Scene, base_size, edge_emphasised, edge_tooltip, edge_width, node_tooltip,
    placeholder_color, planar_world_size, video_height,
};

const LABEL_CHARS: usize = 48;

/// Screen-space footprint of one node this frame.
#[derive(Clone, Copy, Debug)]
struct Footprint {
    center: Pos2,
    /// Full width in pixels. Videos are `width` x `width * 9/16`, users and
    /// dots are circles of diameter `width`.
    width: f32,
    shape: NodeShape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeShape {
    Rectangle,
    Circle,
}

impl Footprint {
    fn rect(self) -> Rect {
        Rect::from_center_size(self.center, Vec2::new(self.width, video_height(self.width)))
    }

    fn contains(self, point: Pos2) -> bool {
        match self.shape {
            NodeShape::Rectangle => self.rect().contains(point),
            NodeShape::Circle => self.center.distance(point) <= self.width * 0.5,
        }
    }

    fn bounding_radius(self) -> f32 {
        self.width * 0.5
    }
}

/// Pan/zoom canvas. Zoom is the global scale that drives level of detail.
pub(in crate::app) struct PlanarRenderer {
    pan: Vec2,
    zoom: f32,
    dragging: Option<usize>,
    footprints: Vec<Footprint>,
}

impl Default for PlanarRenderer {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 0.6,
            dragging: None,
            footprints: Vec::new(),
        }
    }
}

impl PlanarRenderer {
    fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) -> bool {
        if !response.hovered() {
            return false;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return false;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 8.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
        true
    }

    fn world_at(&self, rect: Rect, screen: Pos2) -> Vec3 {
        let world = screen_to_world(rect, self.pan, self.zoom, screen);
        Vec3::new(world.x, world.y, 0.0)
    }

    fn update_footprints(&mut self, rect: Rect, scene: &Scene<'_>, detail: PlanarDetail) {
        self.footprints.clear();
        for (node, position) in scene.nodes.iter().zip(scene.positions) {
            let world = planar_world_size(base_size(node, RendererKind::Planar), self.zoom);
            let shape = match (detail, node.node_type()) {
                (PlanarDetail::Dots, _) | (_, NodeType::User) => NodeShape::Circle,
                (_, NodeType::Video) => NodeShape::Rectangle,
            };
            self.footprints.push(Footprint {
                center: world_to_screen(rect, self.pan, self.zoom, Vec2::new(position.x, position.y)),
                width: world * self.zoom,
                shape,
            });
        }
    }

    fn node_at(&self, point: Pos2) -> Option<usize> {
        self.footprints
            .iter()
            .enumerate()
            .rev()
            .find(|(_, footprint)| footprint.contains(point))
            .map(|(index, _)| index)
    }

    fn edge_at(&self, scene: &Scene<'_>, point: Pos2) -> Option<usize> {
        scene
            .edges
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let start = self.footprints.get(edge.source)?.center;
                let end = self.footprints.get(edge.target)?.center;
                let reach = (edge_width(edge.edge.like_count) * self.zoom * 0.5).max(3.0) + 2.0;
                let distance = distance_to_segment(point, start, end);
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    fn paint_edges(&self, painter: &egui::Painter, rect: Rect, scene: &Scene<'_>) {
        let focus_active = scene.highlight.is_some_and(|highlight| !highlight.is_empty());
        for (index, edge) in scene.edges.iter().enumerate() {
            let (Some(start), Some(end)) =
                (self.footprints.get(edge.source), self.footprints.get(edge.target))
            else {
                continue;
            };
            let width = (edge_width(edge.edge.like_count) * self.zoom).max(0.5);
            if !edge_visible(rect, start.center, end.center, width) {
                continue;
            }

            let emphasised = edge_emphasised(scene, index);
            let (color, end_alpha, mid_alpha) = if emphasised {
                (NEIGHBOR_COLOR, 0.5, 1.0)
            } else if focus_active {
                (EDGE_COLOR, 0.1, 0.35)
            } else {
                (EDGE_COLOR, 0.3, 0.9)
            };
            gradient_segment(painter, start.center, end.center, width, color, end_alpha, mid_alpha);
        }
    }

    fn paint_nodes(
        &self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        scene: &Scene<'_>,
        assets: &mut AssetCache,
        detail: PlanarDetail,
    ) {
        for (index, (node, footprint)) in scene.nodes.iter().zip(&self.footprints).enumerate() {
            if !circle_visible(rect, footprint.center, footprint.bounding_radius() * 1.2) {
                continue;
            }

            let emphasis = NodeEmphasis::for_node(scene, index);
            let tint = if emphasis.dimmed {
                dim_color(Color32::WHITE, 0.45)
            } else {
                Color32::WHITE
            };
            let fill = if emphasis.dimmed {
                dim_color(placeholder_color(node.node_type()), 0.45)
            } else {
                placeholder_color(node.node_type())
            };
            let radius = footprint.bounding_radius();

            let texture = match detail {
                PlanarDetail::Dots => None,
                PlanarDetail::Thumbnails | PlanarDetail::Labelled => node
                    .thumbnail()
                    .and_then(|url| assets.texture(ui.ctx(), url)),
            };

            match (footprint.shape, texture) {
                (NodeShape::Rectangle, Some(texture)) => {
                    painter.image(
                        texture.id(),
                        footprint.rect(),
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        tint,
                    );
                }
                (NodeShape::Rectangle, None) => {
                    painter.rect_filled(footprint.rect(), 0.0, fill);
                }
                (NodeShape::Circle, Some(texture)) => {
                    textured_disc(painter, texture.id(), footprint.center, radius, tint);
                }
                (NodeShape::Circle, None) => {
                    painter.circle_filled(footprint.center, radius, fill);
                }
            }

            if let Some(ring) = emphasis.ring() {
                let width = if emphasis.selected { 3.0 } else { 2.0 };
                match footprint.shape {
                    NodeShape::Rectangle => {
                        painter.rect_stroke(
                            footprint.rect().expand(2.0),
                            0.0,
                            Stroke::new(width, ring),
                            egui::StrokeKind::Outside,
                        );
                    }
                    NodeShape::Circle => {
                        selection_ring(painter, footprint.center, radius + 2.0, ring, width);
                    }
                }
            }

            if detail == PlanarDetail::Labelled {
                let is_video = node.node_type() == NodeType::Video;
                let font_size = if is_video { 20.0 } else { 10.0 } * self.zoom.sqrt();
                let world_width = footprint.width / self.zoom;
                let offset = 30.0 + if is_video { world_width / 4.0 } else { 0.0 };
                let anchor = footprint.center + Vec2::new(0.0, offset * self.zoom);
                let label = truncate_label(node.label(), LABEL_CHARS);
                let font = FontId::proportional(font_size.max(6.0));

                painter.text(
                    anchor + Vec2::splat(1.0),
                    Align2::CENTER_CENTER,
                    &label,
                    font.clone(),
                    with_alpha(Color32::BLACK, 0.8),
                );
                painter.text(anchor, Align2::CENTER_CENTER, label, font, tint);
            }
        }
    }
}

impl Renderer for PlanarRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Planar
    }

    fn paint(&mut self, ui: &mut Ui, scene: &Scene<'_>, assets: &mut AssetCache) -> RenderResponse {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let mut output = RenderResponse::default();
        output.interacting |= self.handle_zoom(ui, rect, &response);

        let detail = PlanarDetail::for_scale(self.zoom);
        self.update_footprints(rect, scene, detail);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered_node = pointer.and_then(|point| self.node_at(point));
        let hovered_edge = match (pointer, hovered_node) {
            (Some(point), None) => self.edge_at(scene, point),
            _ => None,
        };

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui.input(|input| input.pointer.press_origin());
            if let Some(index) = origin.and_then(|point| self.node_at(point)) {
                self.dragging = Some(index);
                let position = self.world_at(rect, origin.unwrap_or(rect.center()));
                output.events.push(RenderEvent::DragStarted { index, position });
            }
        }

        if response.dragged_by(PointerButton::Primary) {
            match (self.dragging, response.interact_pointer_pos()) {
                (Some(_), Some(point)) => {
                    output.events.push(RenderEvent::DragMoved {
                        position: self.world_at(rect, point),
                    });
                }
                (Some(_), None) => {}
                (None, _) => self.pan += response.drag_delta(),
            }
            output.interacting = true;
        }
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
            output.interacting = true;
        }
        if response.drag_stopped() && self.dragging.take().is_some() {
            output.events.push(RenderEvent::DragEnded);
        }

        if response.clicked_by(PointerButton::Primary) {
            if let Some(index) = hovered_node {
                output.events.push(RenderEvent::NodeActivated(index));
            } else if let Some(index) = hovered_edge {
                output.events.push(RenderEvent::EdgeActivated(index));
            }
        }

        self.paint_edges(&painter, rect, scene);
        self.paint_nodes(ui, &painter, rect, scene, assets, detail);

        let tooltip = if self.dragging.is_some() {
            None
        } else if let Some(index) = hovered_node {
            scene.nodes.get(index).map(node_tooltip)
        } else {
            hovered_edge.and_then(|index| scene.edges.get(index)).map(|edge| edge_tooltip(&edge.edge))
        };
        if let Some(text) = tooltip {
            ui.output_mut(|platform| platform.cursor_icon = CursorIcon::PointingHand);
            response.on_hover_text_at_pointer(text);
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint(x: f32, width: f32, shape: NodeShape) -> Footprint {
        Footprint {
            center: pos2(x, 0.0),
            width,
            shape,
        }
    }

    #[test]
    fn video_footprint_is_sixteen_by_nine() {
        let video = footprint(0.0, 160.0, NodeShape::Rectangle);
        assert!(video.contains(pos2(79.0, 44.0)));
        assert!(!video.contains(pos2(0.0, 50.0)));
    }

    #[test]
    fn topmost_node_wins_the_hit_test() {
        let renderer = PlanarRenderer {
            footprints: vec![
                footprint(0.0, 100.0, NodeShape::Circle),
                footprint(10.0, 100.0, NodeShape::Circle),
            ],
            ..PlanarRenderer::default()
        };
        assert_eq!(renderer.node_at(pos2(5.0, 0.0)), Some(1));
        assert_eq!(renderer.node_at(pos2(-45.0, 0.0)), Some(0));
        assert_eq!(renderer.node_at(pos2(500.0, 0.0)), None);
    }
}
