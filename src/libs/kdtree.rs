use crate::libs::params::Metric;

const LEAF_SIZE: usize = 16;

/// A point returned by a neighbor query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Index into the points the tree was built from
    pub idx: usize,
    pub dist: f64,
}

enum KdNode {
    Leaf {
        indices: Vec<usize>,
    },
    Internal {
        dim: usize,
        cut_coord: i64,
        lo: Box<KdNode>,
        hi: Box<KdNode>,
    },
}

/// A 2-D tree over integer rank coordinates.
pub struct KdTree {
    points: Vec<[i64; 2]>,
    root: Option<Box<KdNode>>,
}

impl KdTree {
    pub fn build(points: &[(i64, i64)]) -> Self {
        let points: Vec<[i64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
        if points.is_empty() {
            return KdTree { points, root: None };
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let root = Self::build_recursive(&mut indices, &points, 0);
        KdTree {
            points,
            root: Some(root),
        }
    }

    fn build_recursive(indices: &mut [usize], points: &[[i64; 2]], dim: usize) -> Box<KdNode> {
        if indices.len() <= LEAF_SIZE {
            return Box::new(KdNode::Leaf {
                indices: indices.to_vec(),
            });
        }

        indices.sort_by_key(|&i| points[i][dim]);
        let mid = indices.len() / 2;
        let cut_coord = points[indices[mid]][dim];

        let (left, right) = indices.split_at_mut(mid);
        let lo = Self::build_recursive(left, points, 1 - dim);
        let hi = Self::build_recursive(right, points, 1 - dim);

        Box::new(KdNode::Internal {
            dim,
            cut_coord,
            lo,
            hi,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Up to `k` points within `max_dist` of `query`, nearest first.
    ///
    /// Ties on distance are broken by point index, so results do not depend
    /// on tree layout. Fewer than `k` points come back when the neighborhood
    /// is sparse; the query point itself is included if it is in the tree.
    pub fn nearest(
        &self,
        query: (i64, i64),
        k: usize,
        max_dist: f64,
        metric: Metric,
    ) -> Vec<Neighbor> {
        let mut found = Vec::with_capacity(k.min(self.points.len()));
        if k == 0 {
            return found;
        }
        if let Some(root) = &self.root {
            self.nearest_recursive(root, [query.0, query.1], k, max_dist, metric, &mut found);
        }
        found
    }

    fn nearest_recursive(
        &self,
        node: &KdNode,
        query: [i64; 2],
        k: usize,
        max_dist: f64,
        metric: Metric,
        found: &mut Vec<Neighbor>,
    ) {
        match node {
            KdNode::Leaf { indices } => {
                for &idx in indices {
                    let p = self.points[idx];
                    let dist = metric.distance(p[0] - query[0], p[1] - query[1]);
                    if dist <= max_dist {
                        Self::offer(found, k, Neighbor { idx, dist });
                    }
                }
            }
            KdNode::Internal {
                dim,
                cut_coord,
                lo,
                hi,
            } => {
                let diff = query[*dim] - *cut_coord;
                let (near, far) = if diff < 0 { (lo, hi) } else { (hi, lo) };

                self.nearest_recursive(near, query, k, max_dist, metric, found);

                // every point beyond the cut is at least |diff| away on this axis
                let bound = diff.abs() as f64;
                let worst = if found.len() < k {
                    max_dist
                } else {
                    found[found.len() - 1].dist
                };
                if bound <= worst {
                    self.nearest_recursive(far, query, k, max_dist, metric, found);
                }
            }
        }
    }

    fn offer(found: &mut Vec<Neighbor>, k: usize, cand: Neighbor) {
        let before = |a: &Neighbor, b: &Neighbor| (a.dist, a.idx) < (b.dist, b.idx);

        if found.len() == k && !before(&cand, &found[k - 1]) {
            return;
        }
        let pos = found.partition_point(|n| before(n, &cand));
        found.insert(pos, cand);
        found.truncate(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(
        points: &[(i64, i64)],
        query: (i64, i64),
        k: usize,
        max_dist: f64,
        metric: Metric,
    ) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = points
            .iter()
            .enumerate()
            .map(|(idx, &(x, y))| Neighbor {
                idx,
                dist: metric.distance(x - query.0, y - query.1),
            })
            .filter(|n| n.dist <= max_dist)
            .collect();
        all.sort_by(|a, b| (a.dist, a.idx).partial_cmp(&(b.dist, b.idx)).unwrap());
        all.truncate(k);
        all
    }

    fn lcg_points(n: usize, range: i64) -> Vec<(i64, i64)> {
        let mut state: u64 = 42;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % range as u64) as i64
        };
        (0..n).map(|_| (next(), next())).collect()
    }

    #[test]
    fn test_matches_brute_force() {
        let points = lcg_points(500, 200);
        let tree = KdTree::build(&points);
        assert_eq!(tree.len(), 500);

        for metric in [Metric::Manhattan, Metric::Euclidean] {
            for &query in points.iter().take(50) {
                for k in [1, 5, 64] {
                    let got = tree.nearest(query, k, 40.0, metric);
                    let expected = brute_force(&points, query, k, 40.0, metric);
                    assert_eq!(got, expected);
                }
            }
        }
    }

    #[test]
    fn test_sparse_and_empty() {
        let points = vec![(0, 0), (100, 100), (3, 4)];
        let tree = KdTree::build(&points);

        let got = tree.nearest((0, 0), 64, 40.0, Metric::Euclidean);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Neighbor { idx: 0, dist: 0.0 });
        assert_eq!(got[1], Neighbor { idx: 2, dist: 5.0 });

        let got = tree.nearest((0, 0), 64, 40.0, Metric::Manhattan);
        assert_eq!(got[1].dist, 7.0);

        let empty = KdTree::build(&[]);
        assert!(empty.is_empty());
        assert!(empty.nearest((0, 0), 8, 40.0, Metric::Euclidean).is_empty());
    }

    #[test]
    fn test_duplicate_coordinates() {
        let points = vec![(5, 5); 40];
        let tree = KdTree::build(&points);
        let got = tree.nearest((5, 5), 10, 1.0, Metric::Manhattan);
        let idx: Vec<usize> = got.iter().map(|n| n.idx).collect();
        assert_eq!(idx, (0..10).collect::<Vec<_>>());
    }
}
