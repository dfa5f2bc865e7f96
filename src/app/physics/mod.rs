mod config;
mod forces;
mod tree;

use std::collections::HashMap;
use std::time::Instant;

use glam::Vec3;

use crate::graph::{Edge, Node, NodeType};
pub(in crate::app) use config::SimulationConfig;
use forces::{LinkSpring, apply_centering, apply_collision, apply_links, apply_many_body};
use tree::TreeNode;

const INITIAL_RADIUS: f32 = 10.0;

/// Which space node positions live in. Planar layouts keep `z = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum Dimensions {
    Planar,
    Volumetric,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum SimPhase {
    Stopped,
    Warming { remaining: u32 },
    Running { since: Option<Instant> },
    Settled,
}

impl SimPhase {
    pub(in crate::app) fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Warming { .. } => "warming",
            Self::Running { .. } => "running",
            Self::Settled => "settled",
        }
    }
}

/// Commands the interaction layer may issue. Positions themselves are never
/// written from outside the simulation.
pub(in crate::app) trait SimulationControl {
    fn pause(&mut self);
    fn resume(&mut self);
    fn pin(&mut self, index: usize, position: Vec3);
    fn unpin(&mut self, index: usize);
}

/// An edge resolved to node indices.
#[derive(Clone, Debug)]
pub(in crate::app) struct ResolvedEdge {
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    pub(in crate::app) edge: Edge,
}

pub(in crate::app) struct ForceSimulation {
    dimensions: Dimensions,
    config: SimulationConfig,
    phase: SimPhase,
    /// Short hold taken by clicks and drags.
    held: bool,
    /// The Pause toggle; independent of `held`.
    user_paused: bool,
    alpha: f32,
    ticks: u64,
    node_types: Vec<NodeType>,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    pinned: Vec<Option<Vec3>>,
    edges: Vec<ResolvedEdge>,
    index_by_id: HashMap<String, usize>,
    links: Vec<LinkSpring>,
    charges: Vec<f32>,
    radii: Vec<f32>,
    scratch: Vec<Vec3>,
}

impl ForceSimulation {
    pub(in crate::app) fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            config: SimulationConfig::default(),
            phase: SimPhase::Stopped,
            held: false,
            user_paused: false,
            alpha: 1.0,
            ticks: 0,
            node_types: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            pinned: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            links: Vec::new(),
            charges: Vec::new(),
            radii: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Loads a graph, places every node on the initial layout and enters
    /// warm-up. Edges whose endpoints are missing are skipped.
    pub(in crate::app) fn start(&mut self, nodes: &[Node], edges: &[Edge], config: SimulationConfig) {
        self.config = config;
        self.node_types = nodes.iter().map(Node::node_type).collect();
        self.index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        self.edges.clear();
        for edge in edges {
            let endpoints = (
                self.index_by_id.get(&edge.source),
                self.index_by_id.get(&edge.target),
            );
            match endpoints {
                (Some(&source), Some(&target)) if source != target => {
                    self.edges.push(ResolvedEdge {
                        source,
                        target,
                        edge: edge.clone(),
                    });
                }
                _ => log::debug!(
                    "skipping edge {} -> {}: endpoint missing",
                    edge.source,
                    edge.target
                ),
            }
        }

        self.positions = (0..nodes.len())
            .map(|index| initial_position(self.dimensions, index, nodes.len()))
            .collect();
        self.velocities = vec![Vec3::ZERO; nodes.len()];
        self.pinned = vec![None; nodes.len()];
        self.ticks = 0;
        self.rebuild_parameters();
        self.enter_warmup();

        log::debug!(
            "simulation started with {} nodes and {} springs",
            self.positions.len(),
            self.links.len()
        );
    }

    /// Replaces the force constants and reheats without moving anything.
    pub(in crate::app) fn reconfigure(&mut self, config: SimulationConfig) {
        self.config = config;
        self.rebuild_parameters();
        self.reheat();
    }

    pub(in crate::app) fn reheat(&mut self) {
        if self.phase == SimPhase::Stopped {
            return;
        }
        self.enter_warmup();
    }

    /// One frame of work. Runs pending warm-up ticks synchronously, then a
    /// single tick while running. Returns whether anything moved.
    pub(in crate::app) fn advance(&mut self, now: Instant) -> bool {
        if self.is_paused() {
            return false;
        }

        match self.phase {
            SimPhase::Stopped | SimPhase::Settled => false,
            SimPhase::Warming { remaining } => {
                for _ in 0..remaining {
                    self.tick();
                }
                self.set_phase(SimPhase::Running { since: Some(now) });
                true
            }
            SimPhase::Running { since } => {
                let since = since.unwrap_or(now);
                if self.alpha < self.config.alpha_min
                    || now.saturating_duration_since(since) > self.config.cooldown
                {
                    self.set_phase(SimPhase::Settled);
                    return false;
                }
                self.tick();
                self.phase = SimPhase::Running { since: Some(since) };
                true
            }
        }
    }

    fn enter_warmup(&mut self) {
        self.alpha = 1.0;
        self.set_phase(SimPhase::Warming {
            remaining: self.config.warmup_ticks,
        });
    }

    fn set_phase(&mut self, phase: SimPhase) {
        if self.phase.label() != phase.label() {
            log::debug!(
                "simulation {} -> {} (alpha {:.4}, tick {})",
                self.phase.label(),
                phase.label(),
                self.alpha,
                self.ticks
            );
        }
        self.phase = phase;
    }

    fn rebuild_parameters(&mut self) {
        let config = self.config;
        self.charges = self
            .node_types
            .iter()
            .map(|&node_type| config.repulsion(node_type))
            .collect();
        self.radii = self
            .node_types
            .iter()
            .map(|&node_type| config.collision_radius(node_type))
            .collect();

        let mut degree = vec![0usize; self.node_types.len()];
        for edge in &self.edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }

        self.links = self
            .edges
            .iter()
            .map(|edge| {
                let source_degree = degree[edge.source] as f32;
                let target_degree = degree[edge.target] as f32;
                LinkSpring {
                    source: edge.source,
                    target: edge.target,
                    distance: config.link_distance(edge.edge.like_count),
                    strength: config.link_strength,
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();
    }

    fn tick(&mut self) {
        self.ticks += 1;
        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;

        if self.positions.is_empty() {
            return;
        }

        apply_links(&self.links, &self.positions, &mut self.velocities, self.alpha);
        if let Some(tree) = TreeNode::build(&self.positions, &self.charges) {
            apply_many_body(
                &tree,
                &self.positions,
                &self.charges,
                &mut self.velocities,
                self.config.theta,
                self.alpha,
            );
        }
        apply_centering(&mut self.positions, self.config.center_strength);
        apply_collision(
            &self.positions,
            &mut self.velocities,
            &self.radii,
            self.config.collision_strength,
            &mut self.scratch,
        );

        let retain = 1.0 - self.config.velocity_decay;
        for ((position, velocity), pinned) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(&self.pinned)
        {
            if let Some(fixed) = pinned {
                *position = *fixed;
                *velocity = Vec3::ZERO;
                continue;
            }
            *velocity *= retain;
            if self.dimensions == Dimensions::Planar {
                velocity.z = 0.0;
            }
            *position += *velocity;
        }

        self.reset_non_finite();
    }

    fn reset_non_finite(&mut self) {
        let mut sum = Vec3::ZERO;
        let mut finite = 0usize;
        for position in self.positions.iter().filter(|position| position.is_finite()) {
            sum += *position;
            finite += 1;
        }
        if finite == self.positions.len() {
            return;
        }

        let centroid = if finite > 0 {
            sum / finite as f32
        } else {
            Vec3::ZERO
        };
        for (index, (position, velocity)) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .enumerate()
        {
            if position.is_finite() && velocity.is_finite() {
                continue;
            }
            log::debug!("resetting non-finite position of node {index}");
            *position = centroid + initial_position(self.dimensions, index, self.node_types.len());
            *velocity = Vec3::ZERO;
        }
    }

    pub(in crate::app) fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Whether ticks are blocked, by the Pause toggle or an interaction hold.
    pub(in crate::app) fn is_paused(&self) -> bool {
        self.held || self.user_paused
    }

    pub(in crate::app) fn is_user_paused(&self) -> bool {
        self.user_paused
    }

    pub(in crate::app) fn set_user_paused(&mut self, paused: bool) {
        if self.user_paused != paused {
            log::debug!("layout {}", if paused { "paused" } else { "unpaused" });
        }
        self.user_paused = paused;
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    #[cfg(test)]
    pub(in crate::app) fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub(in crate::app) fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub(in crate::app) fn edges(&self) -> &[ResolvedEdge] {
        &self.edges
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(in crate::app) fn is_pinned(&self, index: usize) -> bool {
        self.pinned.get(index).is_some_and(Option::is_some)
    }
}

impl SimulationControl for ForceSimulation {
    fn pause(&mut self) {
        self.held = true;
    }

    fn resume(&mut self) {
        self.held = false;
    }

    fn pin(&mut self, index: usize, position: Vec3) {
        let position = match self.dimensions {
            Dimensions::Planar => position.with_z(0.0),
            Dimensions::Volumetric => position,
        };
        if !position.is_finite() {
            return;
        }
        if let Some(slot) = self.pinned.get_mut(index) {
            *slot = Some(position);
            self.positions[index] = position;
            self.velocities[index] = Vec3::ZERO;
        }
    }

    fn unpin(&mut self, index: usize) {
        if let Some(slot) = self.pinned.get_mut(index) {
            *slot = None;
        }
    }
}

/// Phyllotaxis spiral in the plane, Fibonacci sphere in space.
fn initial_position(dimensions: Dimensions, index: usize, count: usize) -> Vec3 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let angle = index as f32 * golden_angle;

    match dimensions {
        Dimensions::Planar => {
            let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
            Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        }
        Dimensions::Volumetric => {
            let count = count.max(1) as f32;
            let radius = INITIAL_RADIUS * count.sqrt();
            let y = 1.0 - 2.0 * (index as f32 + 0.5) / count;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            Vec3::new(ring * angle.cos(), y, ring * angle.sin()) * radius
        }
    }
}
