//! Barnes-Hut quadtree with periodic distances
//!
//! The tree is scratch state: built from a slice of [`Source`]s, queried, and
//! thrown away. Nodes live in one `Vec` and refer to each other by index.
//!
//! Each node covers a square (center + half-size). A leaf holds at most one
//! body; inserting into an occupied leaf splits it into NW, NE, SW, SE
//! children. Total mass and center of mass are updated incrementally on the
//! way down every insertion.
//!
//! Acceleration at a point walks from the root. Leaves contribute a direct
//! softened term; an internal node whose side `s` and distance `d` to its
//! center of mass satisfy `s / d < theta` contributes as a single point mass,
//! otherwise its children are visited.

use glam::Vec2;

use super::periodic::Domain;

/// Subdivision stops here; deeper inserts share one bucket leaf.
/// Keeps coincident bodies from splitting forever.
const MAX_DEPTH: u32 = 32;

/// A point mass handed to the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    pub pos: Vec2,
    pub mass: f32,
}

impl Source {
    pub fn new(pos: Vec2, mass: f32) -> Self {
        Self { pos, mass }
    }
}

/// Gravity constants used by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    pub g: f32,
    /// Softening length, always > 0
    pub epsilon: f32,
    /// Opening angle
    pub theta: f32,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Empty,
    /// One body, by index into the source slice
    Leaf(usize),
    /// Bodies that could not be separated within `MAX_DEPTH`
    Bucket(Vec<usize>),
    /// Children in NW, NE, SW, SE order
    Internal([usize; 4]),
}

#[derive(Debug, Clone)]
struct Node {
    center: Vec2,
    half_size: f32,
    depth: u32,
    total_mass: f32,
    center_of_mass: Vec2,
    kind: NodeKind,
}

impl Node {
    fn new(center: Vec2, half_size: f32, depth: u32) -> Self {
        Self {
            center,
            half_size,
            depth,
            total_mass: 0.0,
            center_of_mass: Vec2::ZERO,
            kind: NodeKind::Empty,
        }
    }

    /// Fold one more point mass into the running center of mass
    fn accumulate(&mut self, src: Source) {
        let total = self.total_mass + src.mass;
        if total > 0.0 {
            self.center_of_mass = (self.center_of_mass * self.total_mass + src.pos * src.mass) / total;
        } else if self.total_mass == 0.0 {
            self.center_of_mass = src.pos;
        }
        self.total_mass = total;
    }

    /// 0 = NW, 1 = NE, 2 = SW, 3 = SE (y grows downwards)
    fn quadrant(&self, pos: Vec2) -> usize {
        let mut q = 0;
        if pos.x >= self.center.x {
            q |= 1;
        }
        if pos.y >= self.center.y {
            q |= 2;
        }
        q
    }
}

/// Barnes-Hut tree over one snapshot of body positions
#[derive(Debug, Clone)]
pub struct QuadTree {
    domain: Domain,
    nodes: Vec<Node>,
    sources: Vec<Source>,
}

impl QuadTree {
    /// Build a tree covering the whole domain and insert every source
    pub fn build(domain: Domain, sources: &[Source]) -> Self {
        let half_size = domain.width.max(domain.height) * 0.5;
        let mut tree = Self {
            domain,
            nodes: Vec::with_capacity(sources.len() * 2 + 1),
            sources: sources.to_vec(),
        };
        tree.nodes.push(Node::new(domain.center(), half_size, 0));
        for index in 0..tree.sources.len() {
            debug_assert!(tree.sources[index].mass >= 0.0, "negative mass in tree");
            tree.insert(index);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Mass held by the whole tree
    pub fn total_mass(&self) -> f32 {
        self.nodes[0].total_mass
    }

    /// Center of mass of the whole tree
    pub fn center_of_mass(&self) -> Vec2 {
        self.nodes[0].center_of_mass
    }

    fn insert(&mut self, index: usize) {
        let src = self.sources[index];
        let mut node_idx = 0;
        loop {
            let node = &mut self.nodes[node_idx];
            node.accumulate(src);
            let quadrant = node.quadrant(src.pos);
            let at_max_depth = node.depth >= MAX_DEPTH;

            let children = match &mut node.kind {
                NodeKind::Empty => {
                    node.kind = NodeKind::Leaf(index);
                    return;
                }
                NodeKind::Bucket(members) => {
                    members.push(index);
                    return;
                }
                NodeKind::Leaf(existing) if at_max_depth => {
                    let existing = *existing;
                    node.kind = NodeKind::Bucket(vec![existing, index]);
                    return;
                }
                NodeKind::Leaf(existing) => {
                    let existing = *existing;
                    let children = self.subdivide(node_idx);
                    // Reinsert the displaced body one level down
                    let displaced = self.sources[existing];
                    let q = self.nodes[node_idx].quadrant(displaced.pos);
                    let child = &mut self.nodes[children[q]];
                    child.accumulate(displaced);
                    child.kind = NodeKind::Leaf(existing);
                    children
                }
                NodeKind::Internal(children) => *children,
            };
            node_idx = children[quadrant];
        }
    }

    fn subdivide(&mut self, node_idx: usize) -> [usize; 4] {
        let parent = &self.nodes[node_idx];
        let h = parent.half_size * 0.5;
        let c = parent.center;
        let depth = parent.depth + 1;
        let centers = [
            Vec2::new(c.x - h, c.y - h), // NW
            Vec2::new(c.x + h, c.y - h), // NE
            Vec2::new(c.x - h, c.y + h), // SW
            Vec2::new(c.x + h, c.y + h), // SE
        ];
        let first = self.nodes.len();
        for center in centers {
            self.nodes.push(Node::new(center, h, depth));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node_idx].kind = NodeKind::Internal(children);
        children
    }

    /// Acceleration at `pos` from every body in the tree.
    ///
    /// `exclude` names the source index of the body being accelerated, if any,
    /// so it does not pull on itself.
    pub fn acceleration_at(&self, pos: Vec2, exclude: Option<usize>, params: &GravityParams) -> Vec2 {
        debug_assert!(params.epsilon > 0.0, "softening must be positive");
        let eps2 = params.epsilon * params.epsilon;
        let mut acc = Vec2::ZERO;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if node.total_mass == 0.0 {
                continue;
            }
            match &node.kind {
                NodeKind::Empty => {}
                NodeKind::Leaf(index) => {
                    if Some(*index) != exclude {
                        acc += self.point_accel(pos, self.sources[*index], params.g, eps2);
                    }
                }
                NodeKind::Bucket(members) => {
                    for &index in members.iter().filter(|&&i| Some(i) != exclude) {
                        acc += self.point_accel(pos, self.sources[index], params.g, eps2);
                    }
                }
                NodeKind::Internal(children) => {
                    let dr = self.domain.minimum_image(node.center_of_mass - pos);
                    let d = dr.length();
                    let s = node.half_size * 2.0;
                    // d == 0 gives s/d = inf, which always opens the node
                    if s / d < params.theta {
                        acc += softened(dr, node.total_mass, params.g, eps2);
                    } else {
                        stack.extend_from_slice(children);
                    }
                }
            }
        }
        acc
    }

    /// Acceleration on source `index` from every other source
    pub fn acceleration_on(&self, index: usize, params: &GravityParams) -> Vec2 {
        match self.sources.get(index) {
            Some(src) => self.acceleration_at(src.pos, Some(index), params),
            None => Vec2::ZERO,
        }
    }

    fn point_accel(&self, pos: Vec2, src: Source, g: f32, eps2: f32) -> Vec2 {
        let dr = self.domain.minimum_image(src.pos - pos);
        softened(dr, src.mass, g, eps2)
    }
}

/// `G * M * dr / (|dr|² + ε²)^1.5`
#[inline]
fn softened(dr: Vec2, mass: f32, g: f32, eps2: f32) -> Vec2 {
    let r2 = dr.length_squared() + eps2;
    let inv_r = r2.sqrt().recip();
    dr * (g * mass * inv_r * inv_r * inv_r)
}

/// Exact O(N²) periodic sum, the reference the tree approximates
pub fn direct_acceleration(
    domain: &Domain,
    sources: &[Source],
    pos: Vec2,
    exclude: Option<usize>,
    params: &GravityParams,
) -> Vec2 {
    let eps2 = params.epsilon * params.epsilon;
    sources
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != exclude)
        .map(|(_, src)| softened(domain.minimum_image(src.pos - pos), src.mass, params.g, eps2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(theta: f32) -> GravityParams {
        GravityParams {
            g: 100.0,
            epsilon: 5.0,
            theta,
        }
    }

    fn domain() -> Domain {
        Domain::new(1000.0, 800.0)
    }

    #[test]
    fn test_empty_tree_is_zero() {
        let tree = QuadTree::build(domain(), &[]);
        assert!(tree.is_empty());
        assert_eq!(tree.acceleration_at(Vec2::new(10.0, 10.0), None, &params(0.5)), Vec2::ZERO);
        assert_eq!(tree.acceleration_on(3, &params(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_single_body_excludes_itself() {
        let sources = [Source::new(Vec2::new(500.0, 400.0), 1000.0)];
        let tree = QuadTree::build(domain(), &sources);
        assert_eq!(tree.acceleration_on(0, &params(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_aggregate_mass_and_com() {
        let sources = [
            Source::new(Vec2::new(100.0, 100.0), 1.0),
            Source::new(Vec2::new(300.0, 100.0), 3.0),
            Source::new(Vec2::new(900.0, 700.0), 4.0),
        ];
        let tree = QuadTree::build(domain(), &sources);
        assert!((tree.total_mass() - 8.0).abs() < 1e-5);
        let expected = (sources[0].pos * 1.0 + sources[1].pos * 3.0 + sources[2].pos * 4.0) / 8.0;
        assert!((tree.center_of_mass() - expected).length() < 1e-3);
    }

    #[test]
    fn test_pull_points_at_other_body() {
        let sources = [
            Source::new(Vec2::new(400.0, 400.0), 1000.0),
            Source::new(Vec2::new(600.0, 400.0), 1000.0),
        ];
        let tree = QuadTree::build(domain(), &sources);
        let a0 = tree.acceleration_on(0, &params(0.5));
        let a1 = tree.acceleration_on(1, &params(0.5));
        assert!(a0.x > 0.0 && a0.y.abs() < 1e-6);
        assert!((a0 + a1).length() < 1e-6);
    }

    #[test]
    fn test_pull_goes_through_seam() {
        // 20 units apart through the x seam, 980 the long way round
        let sources = [
            Source::new(Vec2::new(990.0, 400.0), 1000.0),
            Source::new(Vec2::new(10.0, 400.0), 1000.0),
        ];
        let tree = QuadTree::build(domain(), &sources);
        let a0 = tree.acceleration_on(0, &params(0.5));
        assert!(a0.x > 0.0, "body at right edge should be pulled rightwards, got {a0:?}");
    }

    #[test]
    fn test_coincident_bodies_do_not_recurse_forever() {
        let sources = vec![Source::new(Vec2::new(250.0, 250.0), 10.0); 5];
        let tree = QuadTree::build(domain(), &sources);
        assert!(tree.node_count() <= 1 + 4 * MAX_DEPTH as usize);
        let a = tree.acceleration_on(0, &params(0.5));
        // Zero separation and softening: finite, no direction
        assert!(a.length() < 1e-3);
        assert!((tree.total_mass() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_tree_matches_direct_sum_when_fully_opened() {
        let sources: Vec<Source> = (0..40)
            .map(|i| {
                let t = i as f32;
                Source::new(
                    Vec2::new((t * 137.5) % 1000.0, (t * 71.3 + 13.0) % 800.0),
                    50.0 + (i % 7) as f32 * 20.0,
                )
            })
            .collect();
        let tree = QuadTree::build(domain(), &sources);
        let p = params(1e-6);
        for i in 0..sources.len() {
            let exact = direct_acceleration(&domain(), &sources, sources[i].pos, Some(i), &p);
            let approx = tree.acceleration_on(i, &p);
            assert!(
                (exact - approx).length() <= 1e-3 * exact.length().max(1.0),
                "body {i}: exact {exact:?} tree {approx:?}"
            );
        }
    }
}
