//! The two graph renderers and the sizing rules they share.

mod camera;
mod planar;
mod volumetric;

use std::collections::HashSet;

use eframe::egui::{Color32, Ui};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::AssetCache;
use crate::graph::{Edge, Node, NodeType};

use super::graph::SelectionState;
use super::highlight::Highlight;
use super::physics::{Dimensions, ResolvedEdge};

pub(in crate::app) use planar::PlanarRenderer;
pub(in crate::app) use volumetric::VolumetricRenderer;

pub(in crate::app) const VIDEO_PLACEHOLDER: Color32 = Color32::from_rgb(0xCC, 0xCC, 0xCC);
pub(in crate::app) const USER_PLACEHOLDER: Color32 = Color32::from_rgb(0x1F, 0x78, 0xB4);
pub(in crate::app) const EDGE_COLOR: Color32 = Color32::from_rgb(100, 100, 255);
pub(in crate::app) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(in crate::app) const NEIGHBOR_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
pub(in crate::app) const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

const PLANAR_MAX_SIZE: f32 = 200.0;
const VOLUMETRIC_MAX_SIZE: f32 = 60.0;
const VIDEO_ASPECT: f32 = 16.0 / 9.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum RendererKind {
    #[default]
    #[value(name = "2d")]
    #[serde(rename = "2d")]
    Planar,
    #[value(name = "3d")]
    #[serde(rename = "3d")]
    Volumetric,
}

impl RendererKind {
    pub(in crate::app) fn label(self) -> &'static str {
        match self {
            Self::Planar => "2D",
            Self::Volumetric => "3D",
        }
    }

    pub(in crate::app) fn dimensions(self) -> Dimensions {
        match self {
            Self::Planar => Dimensions::Planar,
            Self::Volumetric => Dimensions::Volumetric,
        }
    }

    pub(in crate::app) fn create(self) -> Box<dyn Renderer> {
        match self {
            Self::Planar => Box::new(PlanarRenderer::default()),
            Self::Volumetric => Box::new(VolumetricRenderer::default()),
        }
    }
}

/// Everything a renderer reads for one frame. Positions are owned by the
/// simulation and only borrowed here.
pub(in crate::app) struct Scene<'a> {
    pub(in crate::app) nodes: &'a [Node],
    pub(in crate::app) positions: &'a [Vec3],
    pub(in crate::app) edges: &'a [ResolvedEdge],
    pub(in crate::app) selection: &'a SelectionState,
    pub(in crate::app) highlight: Option<&'a Highlight>,
    pub(in crate::app) search_matches: Option<&'a HashSet<usize>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum RenderEvent {
    NodeActivated(usize),
    EdgeActivated(usize),
    DragStarted { index: usize, position: Vec3 },
    DragMoved { position: Vec3 },
    DragEnded,
}

#[derive(Debug, Default)]
pub(in crate::app) struct RenderResponse {
    pub(in crate::app) events: Vec<RenderEvent>,
    /// The user is moving the view; keep repainting.
    pub(in crate::app) interacting: bool,
}

pub(in crate::app) trait Renderer {
    fn kind(&self) -> RendererKind;

    /// Whether the first paint must wait until every thumbnail resolved.
    fn waits_for_thumbnails(&self) -> bool {
        false
    }

    fn paint(&mut self, ui: &mut Ui, scene: &Scene<'_>, assets: &mut AssetCache) -> RenderResponse;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum PlanarDetail {
    /// Flat coloured circles, no thumbnails.
    Dots,
    Thumbnails,
    Labelled,
}

impl PlanarDetail {
    pub(in crate::app) fn for_scale(scale: f32) -> Self {
        if scale < 0.3 {
            Self::Dots
        } else if scale > 0.5 {
            Self::Labelled
        } else {
            Self::Thumbnails
        }
    }
}

pub(in crate::app) fn user_base_size(subscribers: u64, cap: f32) -> f32 {
    (((subscribers as f64).sqrt() / 10.0 + 10.0) as f32).min(cap)
}

pub(in crate::app) fn base_size(node: &Node, kind: RendererKind) -> f32 {
    let cap = match kind {
        RendererKind::Planar => PLANAR_MAX_SIZE,
        RendererKind::Volumetric => VOLUMETRIC_MAX_SIZE,
    };
    match node.node_type() {
        NodeType::Video => cap,
        NodeType::User => user_base_size(node.subscriber_count(), cap),
    }
}

/// World-space size on the planar canvas; nodes shrink as the view zooms in.
pub(in crate::app) fn planar_world_size(base: f32, scale: f32) -> f32 {
    base / scale.max(f32::EPSILON).sqrt()
}

pub(in crate::app) fn video_height(width: f32) -> f32 {
    width / VIDEO_ASPECT
}

pub(in crate::app) fn edge_width(like_count: u64) -> f32 {
    ((like_count as f32 + 1.0).sqrt() * 1.5).min(5.0)
}

pub(in crate::app) fn placeholder_color(node_type: NodeType) -> Color32 {
    match node_type {
        NodeType::Video => VIDEO_PLACEHOLDER,
        NodeType::User => USER_PLACEHOLDER,
    }
}

pub(in crate::app) fn node_tooltip(node: &Node) -> String {
    format!("ID: {}\nType: {}", node.id, node.node_type().label())
}

pub(in crate::app) fn edge_tooltip(edge: &Edge) -> String {
    format!("{}\n{} likes.", edge.comment, edge.like_count)
}

/// Emphasis applied to one node this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct NodeEmphasis {
    pub(in crate::app) selected: bool,
    pub(in crate::app) neighbor: bool,
    pub(in crate::app) search_match: bool,
    pub(in crate::app) dimmed: bool,
}

impl NodeEmphasis {
    pub(in crate::app) fn for_node(scene: &Scene<'_>, index: usize) -> Self {
        let selected = scene.selection.node_index() == Some(index);
        let neighbor = !selected && scene.highlight.is_some_and(|h| h.nodes.contains(&index));
        let search_match = scene.search_matches.is_some_and(|m| m.contains(&index));
        let focus_active = scene.highlight.is_some_and(|h| !h.is_empty())
            || scene.search_matches.is_some_and(|m| !m.is_empty());
        Self {
            selected,
            neighbor,
            search_match,
            dimmed: focus_active && !selected && !neighbor && !search_match,
        }
    }

    pub(in crate::app) fn ring(self) -> Option<Color32> {
        if self.selected {
            Some(SELECTED_COLOR)
        } else if self.neighbor {
            Some(NEIGHBOR_COLOR)
        } else if self.search_match {
            Some(SEARCH_COLOR)
        } else {
            None
        }
    }
}

pub(in crate::app) fn edge_emphasised(scene: &Scene<'_>, edge_index: usize) -> bool {
    scene.highlight.is_some_and(|h| h.edges.contains(&edge_index))
}
