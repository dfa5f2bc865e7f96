use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::model::{Edge, Node, NodeKind, UserDetails, VideoDetails};

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<Value>,
}

#[derive(Debug)]
enum RawNode {
    Video(RawVideo),
    User(RawUser),
}

#[derive(Debug, Deserialize)]
struct RawVideo {
    #[serde(flatten)]
    base: RawBase,
    #[serde(default, deserialize_with = "text_or_number")]
    title: String,
    #[serde(default, deserialize_with = "text_or_number")]
    like_count: String,
    #[serde(default, deserialize_with = "text_or_number")]
    comment_count: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(flatten)]
    base: RawBase,
    #[serde(default, deserialize_with = "text_or_number")]
    subscriber_count: String,
    #[serde(default, deserialize_with = "text_or_number")]
    video_count: String,
}

#[derive(Debug, Deserialize)]
struct RawBase {
    #[serde(default, deserialize_with = "text_or_number")]
    id: String,
    #[serde(default, deserialize_with = "text_or_number")]
    channel_title: String,
    #[serde(default)]
    thumbnail_link: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    view_count: String,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default, deserialize_with = "text_or_number")]
    source: String,
    #[serde(default, deserialize_with = "text_or_number")]
    target: String,
    #[serde(default, deserialize_with = "lenient_count")]
    like_count: u64,
    #[serde(default, deserialize_with = "text_or_number")]
    comment: String,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|value| value.max(0.0) as u64))
            .unwrap_or(0),
        Value::String(text) => crate::util::parse_count(&text),
        _ => 0,
    })
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let (base, kind) = match raw {
            RawNode::Video(video) => (
                video.base,
                NodeKind::Video(VideoDetails {
                    title: video.title,
                    like_count: video.like_count,
                    comment_count: video.comment_count,
                }),
            ),
            RawNode::User(user) => (
                user.base,
                NodeKind::User(UserDetails {
                    subscriber_count: user.subscriber_count,
                    video_count: user.video_count,
                }),
            ),
        };

        Node {
            id: base.id,
            channel_title: base.channel_title,
            thumbnail_link: base.thumbnail_link,
            view_count: base.view_count,
            kind,
        }
    }
}

impl From<RawEdge> for Edge {
    fn from(raw: RawEdge) -> Self {
        Edge {
            source: raw.source,
            target: raw.target,
            like_count: raw.like_count,
            comment: raw.comment,
        }
    }
}

impl RawNode {
    /// Anything not tagged `"video"` is read as a user.
    fn from_value(value: Value) -> serde_json::Result<Self> {
        if value.get("type").and_then(Value::as_str) == Some("video") {
            RawVideo::deserialize(value).map(Self::Video)
        } else {
            RawUser::deserialize(value).map(Self::User)
        }
    }
}

/// Parses a `{ nodes, edges }` document. Entries that are not JSON objects
/// are skipped with a warning; the rest pass through as-is.
pub fn parse_payload(raw: &str) -> Result<(Vec<Node>, Vec<Edge>)> {
    let parsed: RawPayload = serde_json::from_str(raw).context("invalid graph JSON")?;
    if parsed.nodes.is_empty() && parsed.edges.is_empty() {
        log::info!("graph payload is empty");
    }

    let mut nodes = Vec::with_capacity(parsed.nodes.len());
    for (index, value) in parsed.nodes.into_iter().enumerate() {
        match RawNode::from_value(value) {
            Ok(raw) => nodes.push(Node::from(raw)),
            Err(error) => log::warn!("skipping node #{index}: {error}"),
        }
    }

    let mut edges = Vec::with_capacity(parsed.edges.len());
    for (index, value) in parsed.edges.into_iter().enumerate() {
        match RawEdge::deserialize(value) {
            Ok(raw) => edges.push(Edge::from(raw)),
            Err(error) => log::warn!("skipping edge #{index}: {error}"),
        }
    }

    Ok((nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::NodeType;

    const SAMPLE: &str = r#"{
        "nodes": [
            {"id": "v1", "type": "video", "channel_title": "Chan", "thumbnail_link": "https://i/v1.jpg",
             "view_count": "100", "title": "Hello", "like_count": 12, "comment_count": "3"},
            {"id": "u1", "type": "user", "channel_title": "Commenter", "thumbnail_link": null,
             "view_count": 0, "subscriber_count": "2500", "video_count": "4"},
            {"id": "x", "type": "playlist"}
        ],
        "edges": [
            {"source": "u1", "target": "v1", "like_count": 10, "comment": "hi"},
            {"source": "u1", "target": "v1", "like_count": "7"},
            {"source": "u1", "target": "v1", "like_count": -3, "comment": "negative"}
        ]
    }"#;

    #[test]
    fn parses_tagged_nodes_and_lenient_counts() {
        let (nodes, edges) = parse_payload(SAMPLE).expect("sample parses");

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].node_type(), NodeType::Video);
        assert_eq!(nodes[0].label(), "Hello");
        let NodeKind::Video(video) = &nodes[0].kind else {
            panic!("expected a video");
        };
        assert_eq!(video.like_count, "12");

        assert_eq!(nodes[1].node_type(), NodeType::User);
        assert_eq!(nodes[1].view_count, "0");
        assert_eq!(nodes[1].thumbnail(), None);
        assert_eq!(nodes[1].subscriber_count(), 2500);

        assert_eq!(edges[0].like_count, 10);
        assert_eq!(edges[0].comment, "hi");
        assert_eq!(edges[1].like_count, 7);
        assert_eq!(edges[1].comment, "");
        assert_eq!(edges[2].like_count, 0);
    }

    #[test]
    fn untyped_and_unknown_nodes_read_as_users() {
        let (nodes, _) = parse_payload(SAMPLE).expect("sample parses");
        assert_eq!(nodes[2].id, "x");
        assert_eq!(nodes[2].node_type(), NodeType::User);

        let (nodes, _) =
            parse_payload(r#"{"nodes": [{"id": "n1", "channel_title": "Someone"}, 7]}"#)
                .expect("parses");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type(), NodeType::User);
        assert_eq!(nodes[0].label(), "Someone");
    }

    #[test]
    fn empty_payload_is_an_empty_graph() {
        let (nodes, edges) = parse_payload(r#"{"nodes": [], "edges": []}"#).expect("parses");
        assert!(nodes.is_empty());
        assert!(edges.is_empty());
        assert!(parse_payload("{}").is_ok());
        assert!(parse_payload("not json").is_err());
    }
}
