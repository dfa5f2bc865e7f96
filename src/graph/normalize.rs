use std::collections::HashMap;

use super::model::{Edge, Node};

/// Deduplicates nodes by id and edges by `(source, target)`.
///
/// A duplicate keeps the slot of its first occurrence but takes the data of
/// its last one. Users are then stably moved ahead of videos.
pub fn normalize(nodes: Vec<Node>, edges: Vec<Edge>) -> (Vec<Node>, Vec<Edge>) {
    let mut unique_nodes = dedup_last_wins(nodes, |node| node.id.clone());
    unique_nodes.sort_by_key(Node::is_video);

    let unique_edges = dedup_last_wins(edges, |edge| (edge.source.clone(), edge.target.clone()));

    (unique_nodes, unique_edges)
}

fn dedup_last_wins<T, K>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    K: std::hash::Hash + Eq,
{
    let mut slot_by_key: HashMap<K, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let item_key = key(&item);
        if let Some(&slot) = slot_by_key.get(&item_key) {
            unique[slot] = item;
        } else {
            slot_by_key.insert(item_key, unique.len());
            unique.push(item);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::graph::model::fixtures::{edge, user, video};

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn users_precede_videos_with_relative_order_kept() {
        let nodes = vec![
            video("v1"),
            user("u1", "10"),
            video("v2"),
            user("u2", "10"),
            video("v3"),
        ];

        let (normalized, _) = normalize(nodes, Vec::new());

        assert_eq!(ids(&normalized), vec!["u1", "u2", "v1", "v2", "v3"]);
    }

    #[test]
    fn duplicate_node_keeps_first_slot_and_last_data() {
        let mut replacement = user("u1", "999");
        replacement.channel_title = "renamed".to_owned();

        let nodes = vec![user("u1", "10"), user("u2", "10"), replacement.clone()];
        let (normalized, _) = normalize(nodes, Vec::new());

        assert_eq!(ids(&normalized), vec!["u1", "u2"]);
        assert_eq!(normalized[0], replacement);
    }

    #[test]
    fn duplicate_edges_collapse_to_last_seen() {
        let edges = vec![
            edge("u1", "v1", 1, "first"),
            edge("u2", "v1", 0, "other"),
            edge("u1", "v1", 7, "second"),
        ];

        let (_, normalized) = normalize(Vec::new(), edges);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].comment, "second");
        assert_eq!(normalized[0].like_count, 7);
        assert_eq!(normalized[1].source, "u2");
    }

    #[test]
    fn reversed_endpoints_are_distinct_edges() {
        let edges = vec![edge("a", "b", 0, ""), edge("b", "a", 0, "")];
        let (_, normalized) = normalize(Vec::new(), edges);
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn normalize_is_idempotent_and_keys_are_unique() {
        let nodes = vec![
            video("v1"),
            user("u1", "5"),
            video("v1"),
            user("u2", "5"),
            user("u1", "6"),
            video("v2"),
        ];
        let edges = vec![
            edge("u1", "v1", 3, "a"),
            edge("u1", "v1", 4, "b"),
            edge("u2", "v2", 0, "c"),
            edge("u2", "missing", 0, "dangling"),
        ];

        let once = normalize(nodes, edges);
        let twice = normalize(once.0.clone(), once.1.clone());

        assert_eq!(once, twice);

        let unique_ids = once.0.iter().map(|node| &node.id).collect::<HashSet<_>>();
        assert_eq!(unique_ids.len(), once.0.len());
        let unique_keys = once.1.iter().map(Edge::key).collect::<HashSet<_>>();
        assert_eq!(unique_keys.len(), once.1.len());
    }

    #[test]
    fn malformed_entries_pass_through() {
        let mut nameless = user("", "0");
        nameless.channel_title.clear();
        let (nodes, edges) = normalize(vec![nameless], vec![edge("", "", 0, "")]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(edges.len(), 1);
    }
}
