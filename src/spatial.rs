//! A static kd-tree over mesh vertex coordinates, answering bounded k-nearest-neighbor queries.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::util::dist2;


/// A query result: the index of a vertex and its euclidean distance to the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}


// Heap entry ordered by squared distance, the largest on top.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    d2: f32,
    index: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Candidate) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Candidate) -> Ordering {
        self.d2.total_cmp(&other.d2).then(self.index.cmp(&other.index))
    }
}


/// Nearest-vertex index. The tree is implicit: the node of a range `[lo, hi)` of `order` is its
/// middle element, split along axis `depth % 3`.
#[derive(Debug, Clone)]
pub struct VertexIndex {
    points: Vec<[f32; 3]>,
    order: Vec<usize>,
}


impl VertexIndex {

    pub fn new(points: &[[f32; 3]]) -> VertexIndex {
        let mut order: Vec<usize> = (0..points.len()).collect();
        build(points, &mut order, 0);
        VertexIndex { points: points.to_vec(), order }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find at most `k` vertices within `max_distance` (inclusive) of `point`, sorted by ascending
    /// distance. `k` may be `usize::MAX` and `max_distance` may be infinite.
    pub fn nearest(&self, point: &[f32; 3], k: usize, max_distance: f32) -> Vec<Neighbor> {
        if k == 0 || self.points.is_empty() || max_distance.is_nan() || max_distance < 0.0 {
            return Vec::new();
        }
        let max_d2 = max_distance * max_distance;
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        self.search(0, self.order.len(), 0, point, k, max_d2, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor { index: c.index, distance: c.d2.sqrt() })
            .collect()
    }

    /// The single nearest vertex, if the index is not empty.
    pub fn nearest_one(&self, point: &[f32; 3]) -> Option<Neighbor> {
        self.nearest(point, 1, f32::INFINITY).into_iter().next()
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        p: &[f32; 3],
        k: usize,
        max_d2: f32,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        if hi <= lo {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let index = self.order[mid];
        let q = &self.points[index];

        let d2 = dist2(p, q);
        if d2 <= max_d2 {
            heap.push(Candidate { d2, index });
            if heap.len() > k {
                heap.pop();
            }
        }

        let axis = depth % 3;
        let diff = p[axis] - q[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, p, k, max_d2, heap);

        let bound = match heap.peek() {
            Some(worst) if heap.len() == k => worst.d2.min(max_d2),
            _ => max_d2,
        };
        if diff * diff <= bound {
            self.search(far.0, far.1, depth + 1, p, k, max_d2, heap);
        }
    }
}


fn build(points: &[[f32; 3]], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));
    let (left, right) = order.split_at_mut(mid);
    build(points, left, depth + 1);
    build(points, &mut right[1..], depth + 1);
}
