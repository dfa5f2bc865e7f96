mod model;
mod normalize;
mod parse;
mod source;

pub use model::{Edge, GraphPayload, Node, NodeKind, NodeType};
pub use source::load_payload;

#[cfg(test)]
pub(crate) use model::fixtures;
