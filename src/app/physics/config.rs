use std::time::Duration;

use crate::graph::NodeType;

/// Tunable force constants. Replacing the config on a live simulation
/// reheats it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct SimulationConfig {
    pub(in crate::app) video_repulsion: f32,
    pub(in crate::app) user_repulsion: f32,
    pub(in crate::app) link_base_distance: f32,
    pub(in crate::app) like_cap: u64,
    pub(in crate::app) like_factor: f32,
    pub(in crate::app) link_strength: f32,
    pub(in crate::app) center_strength: f32,
    pub(in crate::app) video_collision_radius: f32,
    pub(in crate::app) user_collision_radius: f32,
    pub(in crate::app) collision_strength: f32,
    pub(in crate::app) warmup_ticks: u32,
    pub(in crate::app) cooldown: Duration,
    pub(in crate::app) alpha_min: f32,
    pub(in crate::app) alpha_decay: f32,
    pub(in crate::app) velocity_decay: f32,
    pub(in crate::app) theta: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            video_repulsion: -100.0,
            user_repulsion: -500.0,
            link_base_distance: 200.0,
            like_cap: 50,
            like_factor: 1.5,
            link_strength: 0.5,
            center_strength: 0.05,
            video_collision_radius: 60.0,
            user_collision_radius: 30.0,
            collision_strength: 0.7,
            warmup_ticks: 100,
            cooldown: Duration::from_millis(3000),
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            theta: 0.9,
        }
    }
}

impl SimulationConfig {
    pub(in crate::app) fn link_distance(&self, like_count: u64) -> f32 {
        self.link_base_distance - like_count.min(self.like_cap) as f32 * self.like_factor
    }

    pub(in crate::app) fn repulsion(&self, node_type: NodeType) -> f32 {
        match node_type {
            NodeType::Video => self.video_repulsion,
            NodeType::User => self.user_repulsion,
        }
    }

    pub(in crate::app) fn collision_radius(&self, node_type: NodeType) -> f32 {
        match node_type {
            NodeType::Video => self.video_collision_radius,
            NodeType::User => self.user_collision_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_distance_shrinks_with_likes_down_to_the_cap() {
        let config = SimulationConfig::default();
        assert_eq!(config.link_distance(0), 200.0);
        assert_eq!(config.link_distance(10), 185.0);
        assert_eq!(config.link_distance(50), 125.0);
        assert_eq!(config.link_distance(1000), 125.0);
    }

    #[test]
    fn alpha_reaches_its_floor_after_about_three_hundred_ticks() {
        let config = SimulationConfig::default();
        let alpha = (1.0 - config.alpha_decay).powi(300);
        assert!((alpha - config.alpha_min).abs() < 1e-4);
    }

    #[test]
    fn per_type_constants() {
        let config = SimulationConfig::default();
        assert_eq!(config.repulsion(NodeType::Video), -100.0);
        assert_eq!(config.repulsion(NodeType::User), -500.0);
        assert_eq!(config.collision_radius(NodeType::Video), 60.0);
        assert_eq!(config.collision_radius(NodeType::User), 30.0);
    }
}
