use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::algorithms::common::euclidean;
use crate::core::error::{MatchError, Result};

#[derive(Debug, Clone)]
struct Node {
    centroid: Vec<f64>,
    radius: f64,
    /// Range into `BallTree::order`.
    start: usize,
    end: usize,
    children: Option<(usize, usize)>,
}

/// Exact k-nearest-neighbor index over fixed-dimension points under the
/// Euclidean metric.
///
/// Nodes are balls (centroid plus covering radius). Internal nodes split at
/// the median of the coordinate with the widest spread; a query prunes any
/// ball whose nearest possible point is farther than the current k-th best.
#[derive(Debug, Clone)]
pub struct BallTree {
    dim: usize,
    data: Vec<f64>,
    order: Vec<usize>,
    nodes: Vec<Node>,
}

impl BallTree {
    /// Build over `data`, a row-major array of `data.len() / dim` points.
    pub fn build(data: Vec<f64>, dim: usize, leaf_size: usize) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(MatchError::IndexBuild(format!(
                "{} values do not form points of dimension {dim}",
                data.len()
            )));
        }
        if data.is_empty() {
            return Err(MatchError::IndexBuild("no points to index".to_string()));
        }
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(MatchError::IndexBuild(format!(
                "non-finite coordinate in point {}",
                i / dim
            )));
        }

        let n = data.len() / dim;
        let mut tree = Self {
            dim,
            data,
            order: (0..n).collect(),
            nodes: Vec::new(),
        };
        tree.build_node(0, n, leaf_size.max(1));
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    fn point(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.dim..(idx + 1) * self.dim]
    }

    fn build_node(&mut self, start: usize, end: usize, leaf_size: usize) -> usize {
        let count = (end - start) as f64;
        let mut centroid = vec![0.0; self.dim];
        for &idx in &self.order[start..end] {
            for (c, v) in centroid.iter_mut().zip(self.point(idx)) {
                *c += v;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= count);
        let radius = self.order[start..end]
            .iter()
            .map(|&idx| euclidean(&centroid, self.point(idx)))
            .fold(0.0, f64::max);

        let node_id = self.nodes.len();
        self.nodes.push(Node {
            centroid,
            radius,
            start,
            end,
            children: None,
        });

        if end - start <= leaf_size {
            return node_id;
        }

        let split_dim = self.widest_dimension(start, end);
        let mid = start + (end - start) / 2;
        let (dim, data) = (self.dim, &self.data);
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            data[a * dim + split_dim]
                .total_cmp(&data[b * dim + split_dim])
                .then(a.cmp(&b))
        });

        let left = self.build_node(start, mid, leaf_size);
        let right = self.build_node(mid, end, leaf_size);
        self.nodes[node_id].children = Some((left, right));
        node_id
    }

    fn widest_dimension(&self, start: usize, end: usize) -> usize {
        (0..self.dim)
            .map(|d| {
                let (lo, hi) = self.order[start..end].iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &idx| {
                        let v = self.data[idx * self.dim + d];
                        (lo.min(v), hi.max(v))
                    },
                );
                (d, hi - lo)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map_or(0, |(d, _)| d)
    }

    /// The `k` nearest points to `query` as `(point index, distance)`,
    /// nearest first. Equal distances order by point index.
    pub fn query(&self, query: &[f64], k: usize) -> Result<Vec<(usize, f64)>> {
        if query.len() != self.dim {
            return Err(MatchError::IndexBuild(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dim
            )));
        }
        let k = k.min(self.len());
        let mut heap: BinaryHeap<(OrderedFloat<f64>, usize)> = BinaryHeap::with_capacity(k);
        if k > 0 {
            self.search(0, query, k, &mut heap);
        }

        let mut found: Vec<(usize, f64)> = heap.into_iter().map(|(d, i)| (i, d.0)).collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(found)
    }

    fn search(
        &self,
        node_id: usize,
        query: &[f64],
        k: usize,
        heap: &mut BinaryHeap<(OrderedFloat<f64>, usize)>,
    ) {
        let node = &self.nodes[node_id];
        let lower_bound = (euclidean(query, &node.centroid) - node.radius).max(0.0);
        if heap.len() == k && heap.peek().is_some_and(|(worst, _)| lower_bound > worst.0) {
            return;
        }

        match node.children {
            None => {
                for &idx in &self.order[node.start..node.end] {
                    let entry = (OrderedFloat(euclidean(query, self.point(idx))), idx);
                    if heap.len() < k {
                        heap.push(entry);
                    } else if heap.peek().is_some_and(|top| entry < *top) {
                        heap.pop();
                        heap.push(entry);
                    }
                }
            }
            Some((left, right)) => {
                let dl = euclidean(query, &self.nodes[left].centroid);
                let dr = euclidean(query, &self.nodes[right].centroid);
                let (near, far) = if dl <= dr { (left, right) } else { (right, left) };
                self.search(near, query, k, heap);
                self.search(far, query, k, heap);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Deterministic pseudo-random points in [-1, 1).
    fn points(n: usize, dim: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n * dim)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    fn brute_force(data: &[f64], dim: usize, query: &[f64], k: usize) -> Vec<(usize, f64)> {
        let mut all: Vec<(usize, f64)> = data
            .chunks(dim)
            .enumerate()
            .map(|(i, p)| (i, euclidean(query, p)))
            .collect();
        all.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        all.truncate(k);
        all
    }

    #[test]
    fn test_matches_brute_force() {
        let dim = 6;
        let data = points(500, dim, 7);
        for leaf_size in [1, 5, 40] {
            let tree = BallTree::build(data.clone(), dim, leaf_size).unwrap();
            assert_eq!(tree.len(), 500);
            for q in 0..5 {
                let query = points(1, dim, 100 + q);
                let got = tree.query(&query, 10).unwrap();
                let expected = brute_force(&data, dim, &query, 10);
                assert_eq!(got, expected, "leaf_size {leaf_size}, query {q}");
            }
        }
    }

    #[test]
    fn test_k_larger_than_population() {
        let data = points(7, 3, 1);
        let tree = BallTree::build(data, 3, 2).unwrap();
        let got = tree.query(&[0.0, 0.0, 0.0], 100).unwrap();
        assert_eq!(got.len(), 7);
        assert!(got.windows(2).all(|w| w[0].1 <= w[1].1));

        let all = tree.query(&[0.0, 0.0, 0.0], usize::MAX).unwrap();
        assert_eq!(all, got);
    }

    #[test]
    fn test_duplicate_points_tie_by_index() {
        let data = vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let tree = BallTree::build(data, 2, 1).unwrap();
        let got = tree.query(&[1.0, 1.0], 2).unwrap();
        assert_eq!(got, vec![(0, 0.0), (2, 0.0)]);
    }

    #[test]
    fn test_build_errors() {
        assert_matches!(BallTree::build(vec![], 3, 4), Err(MatchError::IndexBuild(_)));
        assert_matches!(BallTree::build(vec![1.0, 2.0], 3, 4), Err(MatchError::IndexBuild(_)));
        assert_matches!(
            BallTree::build(vec![1.0, f64::NAN, 0.0, 0.0], 2, 4),
            Err(MatchError::IndexBuild(_))
        );
        let tree = BallTree::build(vec![0.0, 0.0], 2, 4).unwrap();
        assert_matches!(tree.query(&[0.0], 1), Err(MatchError::IndexBuild(_)));
    }
}
