use glam::Vec3;

use super::tree::TreeNode;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Resolved spring between two node indices.
#[derive(Clone, Copy, Debug)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    /// Share of the correction applied to the target; the source takes the rest.
    pub(super) bias: f32,
}

/// Small deterministic nudge for coincident bodies. Stays in the xy plane so
/// planar layouts never leave `z = 0`.
fn jiggle(from: usize, to: usize) -> Vec3 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    Vec3::new(angle.cos(), angle.sin(), 0.0) * 1e-3
}

fn soften(distance_sq: f32) -> f32 {
    if distance_sq < MIN_DISTANCE_SQ {
        (MIN_DISTANCE_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

pub(super) fn apply_many_body(
    tree: &TreeNode,
    positions: &[Vec3],
    charges: &[f32],
    velocities: &mut [Vec3],
    theta: f32,
    alpha: f32,
) {
    let theta_sq = (theta * theta).max(f32::EPSILON);
    for (index, velocity) in velocities.iter_mut().enumerate() {
        if !positions[index].is_finite() {
            continue;
        }
        let mut delta_v = Vec3::ZERO;
        accumulate_many_body(tree, index, positions, charges, theta_sq, alpha, &mut delta_v);
        *velocity += delta_v;
    }
}

fn accumulate_many_body(
    node: &TreeNode,
    index: usize,
    positions: &[Vec3],
    charges: &[f32],
    theta_sq: f32,
    alpha: f32,
    delta_v: &mut Vec3,
) {
    if node.count == 0 || node.charge == 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_squared() == 0.0 {
                delta = jiggle(index, other);
            }
            let distance_sq = soften(delta.length_squared());
            *delta_v += delta * (charges[other] * alpha / distance_sq);
        }
        return;
    }

    let delta = node.center_of_charge - point;
    let distance_sq = delta.length_squared();
    let width = node.bounds.side_length();
    let far_enough = (width * width) / theta_sq < distance_sq;

    if far_enough && !node.bounds.contains(point) {
        *delta_v += delta * (node.charge * alpha / soften(distance_sq));
        return;
    }

    for child in node.children() {
        accumulate_many_body(child, index, positions, charges, theta_sq, alpha, delta_v);
    }
}

pub(super) fn apply_links(
    links: &[LinkSpring],
    positions: &[Vec3],
    velocities: &mut [Vec3],
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if !delta.is_finite() {
            continue;
        }
        if delta.length_squared() == 0.0 {
            delta = jiggle(source, target);
        }

        let length = delta.length();
        let step = delta * ((length - link.distance) / length * alpha * link.strength);
        velocities[target] -= step * link.bias;
        velocities[source] += step * (1.0 - link.bias);
    }
}

/// Shifts every body so the centroid moves `strength` of the way to the origin.
pub(super) fn apply_centering(positions: &mut [Vec3], strength: f32) {
    let mut sum = Vec3::ZERO;
    let mut count = 0usize;
    for position in positions.iter().filter(|position| position.is_finite()) {
        sum += *position;
        count += 1;
    }
    if count == 0 {
        return;
    }

    let shift = (sum / count as f32) * strength;
    for position in positions.iter_mut() {
        *position -= shift;
    }
}

pub(super) fn apply_collision(
    positions: &[Vec3],
    velocities: &mut [Vec3],
    radii: &[f32],
    strength: f32,
    predicted: &mut Vec<Vec3>,
) {
    predicted.clear();
    predicted.extend(
        positions
            .iter()
            .zip(velocities.iter())
            .map(|(position, velocity)| *position + *velocity),
    );

    let Some(tree) = TreeNode::build(predicted, &[]) else {
        return;
    };
    let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
    if max_radius <= 0.0 {
        return;
    }

    for index in 0..predicted.len() {
        if !predicted[index].is_finite() {
            continue;
        }
        collide_with(&tree, index, predicted, radii, max_radius, strength, velocities);
    }
}

fn collide_with(
    node: &TreeNode,
    index: usize,
    predicted: &[Vec3],
    radii: &[f32],
    max_radius: f32,
    strength: f32,
    velocities: &mut [Vec3],
) {
    let point = predicted[index];
    if node.bounds.distance_to(point) > radii[index] + max_radius {
        return;
    }

    if !node.is_leaf() {
        for child in node.children() {
            collide_with(child, index, predicted, radii, max_radius, strength, velocities);
        }
        return;
    }

    for &other in &node.indices {
        if other <= index {
            continue;
        }

        let reach = radii[index] + radii[other];
        let mut delta = point - predicted[other];
        if delta.length_squared() >= reach * reach {
            continue;
        }
        if delta.length_squared() == 0.0 {
            delta = jiggle(index, other);
        }

        let length = delta.length();
        let push = delta * ((reach - length) / length * strength);
        let own_sq = radii[index] * radii[index];
        let other_sq = radii[other] * radii[other];
        let share = other_sq / (own_sq + other_sq);
        velocities[index] += push * share;
        velocities[other] -= push * (1.0 - share);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_pushes_bodies_apart() {
        let positions = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let charges = vec![-100.0, -100.0];
        let mut velocities = vec![Vec3::ZERO; 2];
        let tree = TreeNode::build(&positions, &charges).expect("tree");

        apply_many_body(&tree, &positions, &charges, &mut velocities, 0.9, 1.0);

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert!((velocities[0].x + velocities[1].x).abs() < 1e-4);
    }

    #[test]
    fn approximated_far_field_matches_exact_sum_roughly() {
        let mut positions = (0..40)
            .map(|index| Vec3::new(1000.0 + (index % 8) as f32, (index / 8) as f32, 0.0))
            .collect::<Vec<_>>();
        positions.push(Vec3::ZERO);
        let charges = vec![-10.0; positions.len()];
        let probe = positions.len() - 1;

        let exact = (0..probe)
            .map(|other| {
                let delta = positions[other] - positions[probe];
                delta * (charges[other] / delta.length_squared())
            })
            .sum::<Vec3>();

        let tree = TreeNode::build(&positions, &charges).expect("tree");
        let mut velocities = vec![Vec3::ZERO; positions.len()];
        apply_many_body(&tree, &positions, &charges, &mut velocities, 0.9, 1.0);

        assert!((velocities[probe] - exact).length() < exact.length() * 0.05);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = vec![Vec3::ZERO, Vec3::new(300.0, 0.0, 0.0)];
        let mut velocities = vec![Vec3::ZERO; 2];
        let link = LinkSpring {
            source: 0,
            target: 1,
            distance: 200.0,
            strength: 0.5,
            bias: 0.5,
        };

        apply_links(&[link], &positions, &mut velocities, 1.0);

        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn centering_moves_the_centroid_toward_the_origin() {
        let mut positions = vec![Vec3::new(100.0, 0.0, 0.0), Vec3::new(300.0, 0.0, 0.0)];
        apply_centering(&mut positions, 0.5);
        assert_eq!(positions[0].x, 0.0);
        assert_eq!(positions[1].x, 200.0);
    }

    #[test]
    fn overlapping_bodies_are_separated_heavier_radius_moves_less() {
        let positions = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let radii = vec![60.0, 30.0];
        let mut velocities = vec![Vec3::ZERO; 2];
        let mut scratch = Vec::new();

        apply_collision(&positions, &mut velocities, &radii, 0.7, &mut scratch);

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert!(velocities[0].x.abs() < velocities[1].x.abs());
    }

    #[test]
    fn distant_bodies_do_not_collide() {
        let positions = vec![Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0)];
        let mut velocities = vec![Vec3::ZERO; 2];
        apply_collision(&positions, &mut velocities, &[60.0, 30.0], 0.7, &mut Vec::new());
        assert_eq!(velocities, vec![Vec3::ZERO; 2]);
    }
}
