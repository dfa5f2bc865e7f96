use eframe::egui::{
    self, Color32, CursorIcon, PointerButton, Pos2, Rect, Sense, Stroke, Ui, Vec2,
};
use glam::Vec3;

use crate::assets::AssetCache;
use crate::graph::NodeType;

use super::super::render_utils::{
    blend_color, dim_color, distance_to_segment, draw_background, selection_ring, textured_disc,
    textured_quad, with_alpha,
};
use super::camera::{OrbitCamera, Projected};
use super::{
    EDGE_COLOR, NEIGHBOR_COLOR, NodeEmphasis, RenderEvent, RenderResponse, Renderer, RendererKind,
    Scene, base_size, edge_emphasised, edge_tooltip, edge_width, node_tooltip, placeholder_color,
    video_height,
};

/// Orbit-camera scene with software projection. Videos are upright 16:9
/// planes, users are camera-facing discs, nodes without a thumbnail are
/// shaded spheres.
#[derive(Default)]
pub(in crate::app) struct VolumetricRenderer {
    camera: OrbitCamera,
    framed: bool,
    projected: Vec<Option<Projected>>,
    draw_order: Vec<usize>,
}

impl VolumetricRenderer {
    fn handle_camera(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) -> bool {
        let mut moved = false;

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                self.camera.zoom(scroll);
                moved = true;
            }
        }

        if response.dragged_by(PointerButton::Primary) {
            self.camera.orbit(response.drag_delta());
            moved = true;
        }
        if response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle)
        {
            self.camera.pan(rect, response.drag_delta());
            moved = true;
        }

        moved
    }

    fn project_all(&mut self, rect: Rect, scene: &Scene<'_>) {
        self.projected.clear();
        self.projected.extend(
            scene
                .positions
                .iter()
                .map(|position| self.camera.project(rect, *position)),
        );

        self.draw_order.clear();
        self.draw_order
            .extend((0..self.projected.len()).filter(|&index| self.projected[index].is_some()));
        let depth = |index: usize| self.projected[index].map_or(0.0, |projected| projected.depth);
        self.draw_order
            .sort_by(|&a, &b| depth(b).total_cmp(&depth(a)));
    }

    fn screen_radius(scene: &Scene<'_>, index: usize, projected: Projected) -> f32 {
        scene
            .nodes
            .get(index)
            .map_or(0.0, |node| base_size(node, RendererKind::Volumetric) * projected.scale * 0.5)
    }

    /// Nearest node under `point`.
    fn node_at(&self, scene: &Scene<'_>, point: Pos2) -> Option<usize> {
        self.draw_order
            .iter()
            .rev()
            .copied()
            .find(|&index| {
                self.projected[index].is_some_and(|projected| {
                    projected.pos.distance(point) <= Self::screen_radius(scene, index, projected)
                })
            })
    }

    fn edge_at(&self, scene: &Scene<'_>, point: Pos2) -> Option<usize> {
        scene
            .edges
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let start = (*self.projected.get(edge.source)?)?;
                let end = (*self.projected.get(edge.target)?)?;
                let scale = (start.scale + end.scale) * 0.5;
                let reach = (edge_width(edge.edge.like_count) * scale * 0.5).max(3.0) + 2.0;
                let distance = distance_to_segment(point, start.pos, end.pos);
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    fn paint_edges(&self, painter: &egui::Painter, scene: &Scene<'_>) {
        let focus_active = scene.highlight.is_some_and(|highlight| !highlight.is_empty());
        for (index, edge) in scene.edges.iter().enumerate() {
            let (Some(Some(start)), Some(Some(end))) =
                (self.projected.get(edge.source), self.projected.get(edge.target))
            else {
                continue;
            };
            let scale = (start.scale + end.scale) * 0.5;
            let width = (edge_width(edge.edge.like_count) * scale).clamp(0.5, 8.0);
            let color = if edge_emphasised(scene, index) {
                NEIGHBOR_COLOR
            } else if focus_active {
                with_alpha(EDGE_COLOR, 0.3)
            } else {
                with_alpha(EDGE_COLOR, 0.8)
            };
            painter.line_segment([start.pos, end.pos], Stroke::new(width, color));
        }
    }

    fn paint_nodes(
        &self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        scene: &Scene<'_>,
        assets: &mut AssetCache,
    ) {
        for &index in &self.draw_order {
            let (Some(node), Some(Some(projected))) =
                (scene.nodes.get(index), self.projected.get(index))
            else {
                continue;
            };
            let projected = *projected;
            let radius = Self::screen_radius(scene, index, projected);
            if !rect.expand(radius).contains(projected.pos) {
                continue;
            }

            let emphasis = NodeEmphasis::for_node(scene, index);
            let tint = if emphasis.dimmed {
                dim_color(Color32::WHITE, 0.45)
            } else {
                Color32::WHITE
            };
            let texture = node.thumbnail().and_then(|url| assets.texture(ui.ctx(), url));

            match (node.node_type(), texture) {
                (NodeType::Video, Some(texture)) => {
                    let world = scene.positions[index];
                    let half_width = base_size(node, RendererKind::Volumetric) * 0.5;
                    let half_height = video_height(half_width * 2.0) * 0.5;
                    let corner = |dx: f32, dy: f32| {
                        self.camera
                            .project(rect, world + Vec3::new(dx, dy, 0.0))
                            .map(|corner| corner.pos)
                    };
                    let corners = [
                        corner(-half_width, half_height),
                        corner(half_width, half_height),
                        corner(half_width, -half_height),
                        corner(-half_width, -half_height),
                    ];
                    if let [Some(a), Some(b), Some(c), Some(d)] = corners {
                        textured_quad(painter, texture.id(), [a, b, c, d], tint);
                    }
                }
                (NodeType::User, Some(texture)) => {
                    textured_disc(painter, texture.id(), projected.pos, radius, tint);
                }
                (node_type, None) => {
                    let mut color = placeholder_color(node_type);
                    if emphasis.dimmed {
                        color = dim_color(color, 0.45);
                    }
                    paint_sphere(painter, projected.pos, radius, color);
                }
            }

            if let Some(ring) = emphasis.ring() {
                let width = if emphasis.selected { 3.0 } else { 2.0 };
                selection_ring(painter, projected.pos, radius + 3.0, ring, width);
            }
        }
    }
}

fn paint_sphere(painter: &egui::Painter, center: Pos2, radius: f32, color: Color32) {
    painter.circle_filled(center, radius, dim_color(color, 0.7));
    painter.circle_filled(
        center - Vec2::splat(radius * 0.15),
        radius * 0.8,
        color,
    );
    painter.circle_filled(
        center - Vec2::splat(radius * 0.35),
        radius * 0.3,
        blend_color(color, Color32::WHITE, 0.45),
    );
}

impl Renderer for VolumetricRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Volumetric
    }

    fn waits_for_thumbnails(&self) -> bool {
        true
    }

    fn paint(&mut self, ui: &mut Ui, scene: &Scene<'_>, assets: &mut AssetCache) -> RenderResponse {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        if !self.framed && !scene.positions.is_empty() {
            self.camera.frame(scene.positions);
            self.framed = true;
        }

        let mut output = RenderResponse {
            interacting: self.handle_camera(ui, rect, &response),
            ..RenderResponse::default()
        };
        self.project_all(rect, scene);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered_node = pointer.and_then(|point| self.node_at(scene, point));
        let hovered_edge = match (pointer, hovered_node) {
            (Some(point), None) => self.edge_at(scene, point),
            _ => None,
        };

        if response.clicked_by(PointerButton::Primary) {
            if let Some(index) = hovered_node {
                output.events.push(RenderEvent::NodeActivated(index));
            } else if let Some(index) = hovered_edge {
                output.events.push(RenderEvent::EdgeActivated(index));
            }
        }

        self.paint_edges(&painter, scene);
        self.paint_nodes(ui, &painter, rect, scene, assets);

        let tooltip = if let Some(index) = hovered_node {
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
