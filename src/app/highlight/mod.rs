use std::collections::HashSet;

use super::graph::SelectionState;
use super::physics::ResolvedEdge;

/// Nodes and edges drawn emphasised while something is selected.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Highlight {
    pub(super) nodes: HashSet<usize>,
    pub(super) edges: HashSet<usize>,
}

impl Highlight {
    pub(super) fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The selected node with its direct neighbours, or the selected edge with
/// both endpoints.
pub(super) fn build_highlight(selection: &SelectionState, edges: &[ResolvedEdge]) -> Option<Highlight> {
    let mut highlight = Highlight::default();

    match selection {
        SelectionState::None => return None,
        SelectionState::Node(selected) => {
            highlight.nodes.insert(selected.index);
            for (edge_index, edge) in edges.iter().enumerate() {
                if edge.source == selected.index || edge.target == selected.index {
                    highlight.edges.insert(edge_index);
                    highlight.nodes.insert(edge.source);
                    highlight.nodes.insert(edge.target);
                }
            }
        }
        SelectionState::Edge(selected) => {
            let key = (selected.source.as_str(), selected.target.as_str());
            if let Some((edge_index, edge)) =
                edges.iter().enumerate().find(|(_, edge)| edge.edge.key() == key)
            {
                highlight.edges.insert(edge_index);
                highlight.nodes.insert(edge.source);
                highlight.nodes.insert(edge.target);
            }
        }
    }

    Some(highlight)
}

#[cfg(test)]
mod tests {
    use super::super::graph::{SelectedEdge, SelectedNode};
    use super::*;
    use crate::graph::fixtures::{edge, user};

    fn resolved(source: usize, target: usize, ids: (&str, &str)) -> ResolvedEdge {
        ResolvedEdge {
            source,
            target,
            edge: edge(ids.0, ids.1, 1, ""),
        }
    }

    fn sample_edges() -> Vec<ResolvedEdge> {
        vec![
            resolved(0, 2, ("u1", "v1")),
            resolved(1, 2, ("u2", "v1")),
            resolved(1, 3, ("u2", "v2")),
        ]
    }

    #[test]
    fn node_selection_covers_direct_neighbours_only() {
        let selection = SelectionState::Node(SelectedNode {
            index: 0,
            node: user("u1", "5"),
        });
        let highlight = build_highlight(&selection, &sample_edges()).expect("highlight");

        assert_eq!(highlight.nodes, HashSet::from([0, 2]));
        assert_eq!(highlight.edges, HashSet::from([0]));
    }

    #[test]
    fn edge_selection_covers_its_endpoints() {
        let selection = SelectionState::Edge(SelectedEdge {
            source: "u2".to_owned(),
            target: "v2".to_owned(),
            like_count: 1,
            comment: String::new(),
        });
        let highlight = build_highlight(&selection, &sample_edges()).expect("highlight");

        assert_eq!(highlight.nodes, HashSet::from([1, 3]));
        assert_eq!(highlight.edges, HashSet::from([2]));
    }

    #[test]
    fn nothing_selected_means_no_highlight() {
        assert!(build_highlight(&SelectionState::None, &sample_edges()).is_none());
    }
}
