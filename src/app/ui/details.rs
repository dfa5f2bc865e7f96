use eframe::egui::{self, RichText, Ui};

use crate::assets::{AssetCache, AssetLookup};
use crate::graph::{Node, NodeKind};
use crate::util::format_count;

use super::super::ViewModel;
use super::super::graph::{SelectedEdge, SelectedNode, SelectionState};

fn field(ui: &mut Ui, name: &str, value: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(name).strong());
        ui.label(value);
    });
}

/// A clickable node name; returns whether it was clicked.
fn endpoint(ui: &mut Ui, name: &str, value: &str) -> bool {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(name).strong());
        ui.link(value).on_hover_text("Select this node").clicked()
    })
    .inner
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, assets: &mut AssetCache) {
        match self.interaction.selection().clone() {
            SelectionState::None => {
                ui.heading("Selection Details");
                ui.add_space(6.0);
                ui.label("No item selected");
            }
            SelectionState::Node(selected) => self.draw_node_details(ui, assets, &selected),
            SelectionState::Edge(selected) => self.draw_edge_details(ui, &selected),
        }
    }

    fn draw_node_details(&self, ui: &mut Ui, assets: &mut AssetCache, selected: &SelectedNode) {
        let node = &selected.node;
        ui.heading(node.node_type().label().to_ascii_uppercase());
        ui.add_space(6.0);

        match &node.kind {
            NodeKind::Video(video) => {
                field(ui, "Title:", &video.title);
                field(ui, "Views:", &format_count(&node.view_count));
                field(ui, "Likes:", &format_count(&video.like_count));
                field(ui, "Comments:", &format_count(&video.comment_count));
            }
            NodeKind::User(user) => {
                field(ui, "Channel name:", &node.channel_title);
                field(ui, "Views:", &format_count(&node.view_count));
                field(ui, "Subscribers:", &format_count(&user.subscriber_count));
                field(ui, "Videos:", &format_count(&user.video_count));
            }
        }
        ui.small(node.id.as_str());

        let degree = self
            .simulation
            .edges()
            .iter()
            .filter(|edge| edge.source == selected.index || edge.target == selected.index)
            .count();
        ui.small(format!("{degree} connected comments"));

        let Some(url) = node.thumbnail() else {
            return;
        };
        ui.add_space(10.0);
        match assets.get(url) {
            AssetLookup::Absent => {
                assets.request(url);
                ui.spinner();
            }
            AssetLookup::Pending => {
                ui.spinner();
            }
            AssetLookup::Ready(drawable) => {
                if let Some(texture) = assets.texture(ui.ctx(), url) {
                    let [width, height] = drawable.image.size;
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(&texture))
                            .max_width(ui.available_width()),
                    )
                    .on_hover_text(format!("{width} x {height} px"));
                }
                if drawable.is_fallback {
                    ui.small("Thumbnail unavailable");
                }
            }
        }
    }

    fn draw_edge_details(&mut self, ui: &mut Ui, selected: &SelectedEdge) {
        ui.heading("Comment");
        ui.add_space(6.0);

        let from = self
            .payload
            .node(&selected.source)
            .map_or(selected.source.as_str(), |node| node.channel_title.as_str());
        let to = self
            .payload
            .node(&selected.target)
            .map_or(selected.target.as_str(), edge_target_name);

        let mut follow = None;
        if endpoint(ui, "From channel", from) {
            follow = Some(selected.source.as_str());
        }
        if endpoint(ui, "To video", to) {
            follow = Some(selected.target.as_str());
        }
        field(ui, "Likes:", &selected.like_count.to_string());
        field(ui, "Comment:", comment_text(&selected.comment));

        if let Some(index) = follow.and_then(|id| self.simulation.index_of(id)) {
            self.activate_node(index);
        }
    }
}

fn comment_text(comment: &str) -> &str {
    if comment.is_empty() {
        "No comment"
    } else {
        comment
    }
}

fn edge_target_name(node: &Node) -> &str {
    match &node.kind {
        NodeKind::Video(video) => &video.title,
        NodeKind::User(_) => &node.channel_title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{user, video};

    #[test]
    fn edge_targets_are_named_by_title_or_channel() {
        assert_eq!(edge_target_name(&video("v1")), "v1 title");
        assert_eq!(edge_target_name(&user("u1", "5")), "u1 channel");
    }

    #[test]
    fn empty_comments_get_a_placeholder() {
        assert_eq!(comment_text(""), "No comment");
        assert_eq!(comment_text("hi"), "hi");
    }
}
