use glam::Vec3;

const TREE_LEAF_CAPACITY: usize = 12;
const TREE_MAX_DEPTH: usize = 10;

/// Axis-aligned cube. Planar layouts keep every point at `z = 0`, so only
/// the four upper-z octants are ever populated and the tree behaves as a
/// quadtree.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cube {
    pub(super) center: Vec3,
    pub(super) half_extent: f32,
}

impl Cube {
    fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for point in points.iter().filter(|point| point.is_finite()) {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = (max - min).max(Vec3::ONE);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.max_element() * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.max_element() <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_to(self, point: Vec3) -> f32 {
        ((point - self.center).abs() - Vec3::splat(self.half_extent))
            .max(Vec3::ZERO)
            .length()
    }

    fn child(self, octant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if octant & bit == 0 { -quarter } else { quarter };
        Self {
            center: self.center + Vec3::new(sign(1), sign(2), sign(4)),
            half_extent: quarter,
        }
    }

    fn octant_for(self, point: Vec3) -> usize {
        usize::from(point.x >= self.center.x)
            | (usize::from(point.y >= self.center.y) << 1)
            | (usize::from(point.z >= self.center.z) << 2)
    }
}

/// Barnes-Hut cell. `charge` is the summed strength of every body below the
/// cell; `center_of_charge` is weighted by absolute strength.
pub(super) struct TreeNode {
    pub(super) bounds: Cube,
    pub(super) center_of_charge: Vec3,
    pub(super) charge: f32,
    pub(super) count: usize,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<TreeNode>>; 8],
}

impl TreeNode {
    /// Builds over every finite position. `charges[i]` belongs to
    /// `positions[i]`.
    pub(super) fn build(positions: &[Vec3], charges: &[f32]) -> Option<Self> {
        let bounds = Cube::from_points(positions)?;
        let indices = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, charges, 0))
    }

    fn build_node(
        bounds: Cube,
        indices: Vec<usize>,
        positions: &[Vec3],
        charges: &[f32],
        depth: usize,
    ) -> Self {
        let mut weighted = Vec3::ZERO;
        let mut weight = 0.0;
        let mut charge = 0.0;
        for &index in &indices {
            let strength = charges.get(index).copied().unwrap_or(0.0);
            weighted += positions[index] * strength.abs();
            weight += strength.abs();
            charge += strength;
        }

        let center_of_charge = if weight > 0.0 {
            weighted / weight
        } else {
            bounds.center
        };

        let mut node = Self {
            bounds,
            center_of_charge,
            charge,
            count: indices.len(),
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= TREE_MAX_DEPTH || node.indices.len() <= TREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 8, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.octant_for(positions[index])].push(index);
        }

        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (octant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[octant] = Some(Box::new(Self::build_node(
                bounds.child(octant),
                bucket,
                positions,
                charges,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec3> {
        (0..count)
            .map(|index| Vec3::new((index % 10) as f32 * 15.0, (index / 10) as f32 * 15.0, 0.0))
            .collect()
    }

    fn leaf_indices(node: &TreeNode, out: &mut Vec<usize>) {
        out.extend_from_slice(&node.indices);
        for child in node.children() {
            leaf_indices(child, out);
        }
    }

    #[test]
    fn root_aggregates_every_body() {
        let positions = grid(60);
        let charges = vec![-2.0; positions.len()];
        let tree = TreeNode::build(&positions, &charges).expect("tree");

        assert_eq!(tree.count, 60);
        assert!((tree.charge + 120.0).abs() < 1e-3);
        assert!(!tree.is_leaf());

        let mut indices = Vec::new();
        leaf_indices(&tree, &mut indices);
        indices.sort_unstable();
        assert_eq!(indices, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn center_of_charge_is_weighted_by_strength() {
        let positions = vec![Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)];
        let charges = vec![-100.0, -300.0];
        let tree = TreeNode::build(&positions, &charges).expect("tree");

        assert!((tree.center_of_charge.x - 75.0).abs() < 1e-3);
    }

    #[test]
    fn non_finite_positions_are_left_out() {
        let positions = vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE];
        let tree = TreeNode::build(&positions, &[-1.0; 3]).expect("tree");
        assert_eq!(tree.count, 2);
        assert!(tree.bounds.contains(Vec3::ONE));
    }

    #[test]
    fn nothing_finite_builds_nothing() {
        assert!(TreeNode::build(&[Vec3::splat(f32::INFINITY)], &[-1.0]).is_none());
        assert!(TreeNode::build(&[], &[]).is_none());
    }
}
