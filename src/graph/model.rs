use crate::util::parse_count;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    User,
    Video,
}

impl NodeType {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Video => "video",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: String,
    pub like_count: String,
    pub comment_count: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDetails {
    pub subscriber_count: String,
    pub video_count: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Video(VideoDetails),
    User(UserDetails),
}

/// A graph vertex: either a video or a commenting user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub channel_title: String,
    pub thumbnail_link: Option<String>,
    pub view_count: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Video(_) => NodeType::Video,
            NodeKind::User(_) => NodeType::User,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, NodeKind::Video(_))
    }

    /// Title for videos, channel name for users, id as the last resort.
    pub fn label(&self) -> &str {
        if let NodeKind::Video(video) = &self.kind
            && !video.title.is_empty()
        {
            return &video.title;
        }

        if !self.channel_title.is_empty() {
            &self.channel_title
        } else {
            &self.id
        }
    }

    pub fn subscriber_count(&self) -> u64 {
        match &self.kind {
            NodeKind::User(user) => parse_count(&user.subscriber_count),
            NodeKind::Video(_) => 0,
        }
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail_link
            .as_deref()
            .filter(|link| !link.trim().is_empty())
    }
}

/// A directed "commented on" relation, referencing nodes by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub like_count: u64,
    pub comment: String,
}

impl Edge {
    pub fn key(&self) -> (&str, &str) {
        (self.source.as_str(), self.target.as_str())
    }
}

/// The normalized payload handed to one graph view.
#[derive(Clone, Debug, Default)]
pub struct GraphPayload {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphPayload {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn thumbnail_urls(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(Node::thumbnail)
    }

    pub fn count_by_type(&self, node_type: NodeType) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.node_type() == node_type)
            .count()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn video(id: &str) -> Node {
        Node {
            id: id.to_owned(),
            channel_title: format!("{id} channel"),
            thumbnail_link: Some(format!("https://img.example/{id}.jpg")),
            view_count: "1200".to_owned(),
            kind: NodeKind::Video(VideoDetails {
                title: format!("{id} title"),
                like_count: "40".to_owned(),
                comment_count: "3".to_owned(),
            }),
        }
    }

    pub fn user(id: &str, subscribers: &str) -> Node {
        Node {
            id: id.to_owned(),
            channel_title: format!("{id} channel"),
            thumbnail_link: Some(format!("https://img.example/{id}.jpg")),
            view_count: "0".to_owned(),
            kind: NodeKind::User(UserDetails {
                subscriber_count: subscribers.to_owned(),
                video_count: "2".to_owned(),
            }),
        }
    }

    pub fn edge(source: &str, target: &str, like_count: u64, comment: &str) -> Edge {
        Edge {
            source: source.to_owned(),
            target: target.to_owned(),
            like_count,
            comment: comment.to_owned(),
        }
    }
}
