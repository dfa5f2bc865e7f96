use std::collections::VecDeque;

use glam::Vec3;

use crate::graph::{Edge, Node};

use super::super::physics::SimulationControl;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct SelectedNode {
    pub(in crate::app) index: usize,
    pub(in crate::app) node: Node,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct SelectedEdge {
    pub(in crate::app) source: String,
    pub(in crate::app) target: String,
    pub(in crate::app) like_count: u64,
    pub(in crate::app) comment: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) enum SelectionState {
    #[default]
    None,
    Node(SelectedNode),
    Edge(SelectedEdge),
}

impl SelectionState {
    pub(in crate::app) fn node_index(&self) -> Option<usize> {
        match self {
            Self::Node(selected) => Some(selected.index),
            Self::None | Self::Edge(_) => None,
        }
    }

    pub(in crate::app) fn is_edge(&self, source: &str, target: &str) -> bool {
        matches!(self, Self::Edge(selected) if selected.source == source && selected.target == target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    Resume,
}

/// Turns pointer gestures into selection changes and simulation commands.
///
/// Activating a node or edge pauses the simulation immediately and resumes
/// it on the following frame, so the layout does not shift under the click.
#[derive(Default)]
pub(in crate::app) struct InteractionController {
    selection: SelectionState,
    deferred: VecDeque<Deferred>,
    dragging: Option<usize>,
    transitions: u64,
}

impl InteractionController {
    pub(in crate::app) fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Number of times the selection actually changed.
    pub(in crate::app) fn transitions(&self) -> u64 {
        self.transitions
    }

    pub(in crate::app) fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub(in crate::app) fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub(in crate::app) fn on_node_activate(
        &mut self,
        sim: &mut impl SimulationControl,
        index: usize,
        node: &Node,
    ) -> bool {
        sim.pause();
        let changed = self.selection.node_index() != Some(index);
        if changed {
            self.set_selection(SelectionState::Node(SelectedNode {
                index,
                node: node.clone(),
            }));
        }
        self.deferred.push_back(Deferred::Resume);
        changed
    }

    pub(in crate::app) fn on_edge_activate(
        &mut self,
        sim: &mut impl SimulationControl,
        edge: &Edge,
    ) -> bool {
        sim.pause();
        let changed = !self.selection.is_edge(&edge.source, &edge.target);
        if changed {
            self.set_selection(SelectionState::Edge(SelectedEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                like_count: edge.like_count,
                comment: edge.comment.clone(),
            }));
        }
        self.deferred.push_back(Deferred::Resume);
        changed
    }

    pub(in crate::app) fn on_drag_start(
        &mut self,
        sim: &mut impl SimulationControl,
        index: usize,
        position: Vec3,
    ) {
        sim.pause();
        sim.pin(index, position);
        self.dragging = Some(index);
    }

    pub(in crate::app) fn on_drag_move(&mut self, sim: &mut impl SimulationControl, position: Vec3) {
        if let Some(index) = self.dragging {
            sim.pin(index, position);
        }
    }

    pub(in crate::app) fn on_drag_end(&mut self, sim: &mut impl SimulationControl) {
        if let Some(index) = self.dragging.take() {
            sim.unpin(index);
        }
        sim.resume();
    }

    /// Runs commands queued by the previous frame. Call once at frame start.
    pub(in crate::app) fn flush_deferred(&mut self, sim: &mut impl SimulationControl) -> usize {
        let mut flushed = 0;
        while let Some(command) = self.deferred.pop_front() {
            match command {
                Deferred::Resume => sim.resume(),
            }
            flushed += 1;
        }
        flushed
    }

    /// Forgets the selection; the nodes it referred to are gone.
    pub(in crate::app) fn reset(&mut self) {
        self.selection = SelectionState::None;
        self.deferred.clear();
        self.dragging = None;
    }

    fn set_selection(&mut self, selection: SelectionState) {
        self.selection = selection;
        self.transitions += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::super::super::physics::{Dimensions, ForceSimulation, SimPhase, SimulationConfig};
    use super::*;
    use crate::graph::fixtures::{edge, user, video};

    #[derive(Debug, Default)]
    struct Recorder {
        paused: bool,
        calls: Vec<String>,
    }

    impl SimulationControl for Recorder {
        fn pause(&mut self) {
            self.paused = true;
            self.calls.push("pause".to_owned());
        }

        fn resume(&mut self) {
            self.paused = false;
            self.calls.push("resume".to_owned());
        }

        fn pin(&mut self, index: usize, _position: Vec3) {
            self.calls.push(format!("pin {index}"));
        }

        fn unpin(&mut self, index: usize) {
            self.calls.push(format!("unpin {index}"));
        }
    }

    #[test]
    fn activating_the_same_node_twice_is_one_transition() {
        let mut sim = Recorder::default();
        let mut controller = InteractionController::default();
        let node = video("v1");

        assert!(controller.on_node_activate(&mut sim, 1, &node));
        assert!(!controller.on_node_activate(&mut sim, 1, &node));

        assert_eq!(controller.transitions(), 1);
        assert_eq!(controller.selection().node_index(), Some(1));
    }

    #[test]
    fn resume_is_deferred_to_the_next_frame() {
        let mut sim = Recorder::default();
        let mut controller = InteractionController::default();

        controller.on_node_activate(&mut sim, 0, &user("u1", "10"));
        assert!(sim.paused);
        assert!(controller.has_deferred());

        assert_eq!(controller.flush_deferred(&mut sim), 1);
        assert!(!sim.paused);
        assert_eq!(sim.calls, vec!["pause", "resume"]);
        assert_eq!(controller.flush_deferred(&mut sim), 0);
    }

    #[test]
    fn edge_selection_is_keyed_by_endpoints() {
        let mut sim = Recorder::default();
        let mut controller = InteractionController::default();

        assert!(controller.on_edge_activate(&mut sim, &edge("u1", "v1", 3, "first")));
        assert!(!controller.on_edge_activate(&mut sim, &edge("u1", "v1", 3, "first")));
        assert!(controller.on_edge_activate(&mut sim, &edge("u2", "v1", 0, "")));

        let SelectionState::Edge(selected) = controller.selection() else {
            panic!("expected an edge selection");
        };
        assert_eq!(selected.comment, "");
        assert_eq!(controller.transitions(), 2);
    }

    #[test]
    fn drag_pins_then_releases_and_resumes() {
        let mut sim = Recorder::default();
        let mut controller = InteractionController::default();

        controller.on_drag_start(&mut sim, 4, Vec3::ZERO);
        assert_eq!(controller.dragging(), Some(4));
        controller.on_drag_move(&mut sim, Vec3::ONE);
        controller.on_drag_end(&mut sim);

        assert_eq!(controller.dragging(), None);
        assert_eq!(sim.calls, vec!["pause", "pin 4", "pin 4", "unpin 4", "resume"]);
    }

    #[test]
    fn drag_end_without_a_drag_still_resumes() {
        let mut sim = Recorder::default();
        let mut controller = InteractionController::default();
        sim.pause();
        controller.on_drag_end(&mut sim);
        assert!(!sim.paused);
    }

    #[test]
    fn clicking_an_edge_on_a_live_simulation_selects_it() {
        let nodes = vec![user("u1", "2500"), video("v1")];
        let edges = vec![edge("u1", "v1", 10, "hi")];
        let mut sim = ForceSimulation::new(Dimensions::Planar);
        sim.start(&nodes, &edges, SimulationConfig::default());
        let mut controller = InteractionController::default();

        let now = Instant::now();
        sim.advance(now);
        let resolved = sim.edges()[0].edge.clone();
        controller.on_edge_activate(&mut sim, &resolved);

        let frozen = sim.positions().to_vec();
        assert!(!sim.advance(now));
        assert_eq!(sim.positions(), frozen.as_slice());

        controller.flush_deferred(&mut sim);
        assert!(sim.advance(now));
        assert!(matches!(sim.phase(), SimPhase::Running { .. }));

        assert_eq!(
            controller.selection(),
            &SelectionState::Edge(SelectedEdge {
                source: "u1".to_owned(),
                target: "v1".to_owned(),
                like_count: 10,
                comment: "hi".to_owned(),
            })
        );
    }
}
