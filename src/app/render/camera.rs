use eframe::egui::{Pos2, Rect, Vec2};
use glam::Vec3;

const NEAR_PLANE: f32 = 1.0;

/// A point projected onto the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Projected {
    pub(super) pos: Pos2,
    /// Distance along the view axis; larger is farther away.
    pub(super) depth: f32,
    /// Screen pixels per world unit at this depth.
    pub(super) scale: f32,
}

/// Camera orbiting `target` at `distance`, looking inward.
#[derive(Clone, Copy, Debug)]
pub(super) struct OrbitCamera {
    pub(super) target: Vec3,
    pub(super) yaw: f32,
    pub(super) pitch: f32,
    pub(super) distance: f32,
    pub(super) fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 1_000.0,
            fov_y: 40_f32.to_radians(),
        }
    }
}

impl OrbitCamera {
    pub(super) fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    /// Right, up and forward unit vectors of the view.
    pub(super) fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.eye()).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        (right, up, forward)
    }

    fn focal_length(&self, rect: Rect) -> f32 {
        (rect.height() * 0.5) / (self.fov_y * 0.5).tan()
    }

    pub(super) fn project(&self, rect: Rect, world: Vec3) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let relative = world - self.eye();
        let depth = relative.dot(forward);
        if depth < NEAR_PLANE || !depth.is_finite() {
            return None;
        }

        let scale = self.focal_length(rect) / depth;
        let offset = Vec2::new(relative.dot(right), -relative.dot(up)) * scale;
        Some(Projected {
            pos: rect.center() + offset,
            depth,
            scale,
        })
    }

    pub(super) fn orbit(&mut self, drag: Vec2) {
        self.yaw -= drag.x * 0.008;
        self.pitch = (self.pitch + drag.y * 0.008).clamp(-1.5, 1.5);
    }

    /// Moves the orbit target in the view plane.
    pub(super) fn pan(&mut self, rect: Rect, drag: Vec2) {
        let (right, up, _) = self.basis();
        let world_per_pixel = self.distance / self.focal_length(rect);
        self.target += (-right * drag.x + up * drag.y) * world_per_pixel;
    }

    pub(super) fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * 0.0018).clamp(0.85, 1.15);
        self.distance = (self.distance * factor).clamp(50.0, 50_000.0);
    }

    /// Backs the camera off far enough to see every position.
    pub(super) fn frame(&mut self, positions: &[Vec3]) {
        let finite = positions.iter().filter(|position| position.is_finite());
        let (sum, count) = finite
            .clone()
            .fold((Vec3::ZERO, 0usize), |(sum, count), position| (sum + *position, count + 1));
        if count == 0 {
            return;
        }
        let center = sum / count as f32;
        let radius = finite
            .map(|position| position.distance(center))
            .fold(0.0_f32, f32::max);

        self.target = center;
        self.distance = ((radius + 100.0) / (self.fov_y * 0.5).tan()).clamp(200.0, 50_000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn target_projects_to_the_viewport_center() {
        let camera = OrbitCamera::default();
        let projected = camera.project(viewport(), Vec3::ZERO).expect("in front");
        assert!((projected.pos - Pos2::new(400.0, 300.0)).length() < 1e-3);
        assert!((projected.depth - 1_000.0).abs() < 1e-2);
    }

    #[test]
    fn right_and_up_map_to_screen_right_and_up() {
        let camera = OrbitCamera::default();
        let right = camera.project(viewport(), Vec3::new(100.0, 0.0, 0.0)).expect("visible");
        let up = camera.project(viewport(), Vec3::new(0.0, 100.0, 0.0)).expect("visible");
        assert!(right.pos.x > 400.0);
        assert!(up.pos.y < 300.0);
    }

    #[test]
    fn nearer_points_are_drawn_larger() {
        let camera = OrbitCamera::default();
        let near = camera.project(viewport(), Vec3::new(0.0, 0.0, 500.0)).expect("visible");
        let far = camera.project(viewport(), Vec3::new(0.0, 0.0, -500.0)).expect("visible");
        assert!(near.scale > far.scale);
        assert!(near.depth < far.depth);
    }

    #[test]
    fn points_behind_the_camera_are_culled() {
        let camera = OrbitCamera::default();
        assert!(camera.project(viewport(), Vec3::new(0.0, 0.0, 2_000.0)).is_none());
    }

    #[test]
    fn framing_fits_all_positions() {
        let mut camera = OrbitCamera::default();
        let positions = [Vec3::new(-800.0, 0.0, 0.0), Vec3::new(800.0, 0.0, 0.0)];
        camera.frame(&positions);
        for position in positions {
            let projected = camera.project(viewport(), position).expect("visible");
            assert!(viewport().contains(projected.pos));
        }
    }
}
