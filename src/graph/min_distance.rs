use std::collections::HashMap;

use crate::model::VertexId;

use super::Graph;

/// Computes the routed (along-edge) distance between two vertices.
///
/// Label-correcting search over a frontier kept sorted by tentative
/// distance. Edge lengths are non-negative, so the first time the target
/// is popped its distance is final and equals Dijkstra's result.
pub struct MinDistance {
    from: VertexId,
    to: VertexId,
}

impl MinDistance {
    /// Creates a new `MinDistance` query.
    #[must_use]
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    /// Executes the query, returning the distance in microns or
    /// `f64::INFINITY` if `to` is unreachable.
    ///
    /// The search always runs from the smaller ID so that floating-point
    /// summation order, and therefore the result, is identical in both
    /// directions.
    #[must_use]
    pub fn execute(&self, graph: &Graph) -> f64 {
        if self.from == self.to {
            return 0.0;
        }
        let (source, target) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };

        let mut distance: HashMap<VertexId, f64> = HashMap::new();
        distance.insert(source, 0.0);
        let mut frontier: Vec<(f64, VertexId)> = vec![(0.0, source)];

        while !frontier.is_empty() {
            let (d, vertex) = frontier.remove(0);
            if vertex == target {
                return d;
            }
            for hop in graph.neighbors(vertex) {
                let candidate = d + hop.length;
                let known = distance.get(&hop.vertex).copied().unwrap_or(f64::INFINITY);
                if candidate >= known {
                    continue;
                }
                distance.insert(hop.vertex, candidate);
                if let Some(pos) = frontier.iter().position(|&(_, v)| v == hop.vertex) {
                    frontier.remove(pos);
                }
                let at = frontier.partition_point(|&entry| entry < (candidate, hop.vertex));
                frontier.insert(at, (candidate, hop.vertex));
            }
        }

        f64::INFINITY
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ElectricalParams;
    use crate::math::Point3;
    use crate::model::VehicleModel;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn graph(points: &[(u32, [f64; 3])], edges: &[(u32, u32)]) -> Graph {
        let mut model = VehicleModel::new(ElectricalParams::default());
        for &(label, [x, y, z]) in points {
            model.add_vertex(label, Point3::new(x, y, z)).unwrap();
        }
        for &(a, b) in edges {
            model.add_edge(a, b).unwrap();
        }
        Graph::new(model)
    }

    fn v(g: &Graph, label: u32) -> VertexId {
        g.model().vertex_by_label(label).unwrap()
    }

    #[test]
    fn single_edge_is_its_length() {
        let g = graph(
            &[(1, [0.0, 0.0, 0.0]), (2, [100_000.0, 0.0, 0.0])],
            &[(1, 2)],
        );
        let d = g.min_distance(v(&g, 1), v(&g, 2));
        assert_relative_eq!(d, 100_000.0);
        assert_relative_eq!(g.min_distance_feet(v(&g, 1), v(&g, 2)), 0.328_083, epsilon = 1e-6);
    }

    #[test]
    fn routes_around_instead_of_straight_line() {
        // 1 -> 2 -> 3 is an L; there is no direct edge 1-3.
        let g = graph(
            &[
                (1, [0.0, 0.0, 0.0]),
                (2, [300.0, 0.0, 0.0]),
                (3, [300.0, 400.0, 0.0]),
            ],
            &[(1, 2), (2, 3)],
        );
        assert_relative_eq!(g.min_distance(v(&g, 1), v(&g, 3)), 700.0);
    }

    #[test]
    fn prefers_shorter_alternate_path() {
        // Direct edge 1-4 is long; 1-2-3-4 hugs the straight line.
        let g = graph(
            &[
                (1, [0.0, 0.0, 0.0]),
                (2, [100.0, 10.0, 0.0]),
                (3, [200.0, 10.0, 0.0]),
                (4, [300.0, 0.0, 0.0]),
                (5, [150.0, 5_000.0, 0.0]),
            ],
            &[(1, 5), (5, 4), (1, 2), (2, 3), (3, 4)],
        );
        let direct = g.min_distance(v(&g, 1), v(&g, 4));
        let expected = 2.0 * (100.0_f64.powi(2) + 10.0_f64.powi(2)).sqrt() + 100.0;
        assert_relative_eq!(direct, expected, epsilon = 1e-9);
    }

    #[test]
    fn unreachable_is_infinite() {
        let g = graph(
            &[
                (1, [0.0, 0.0, 0.0]),
                (2, [1.0, 0.0, 0.0]),
                (3, [5.0, 0.0, 0.0]),
            ],
            &[(1, 2)],
        );
        assert!(g.min_distance(v(&g, 1), v(&g, 3)).is_infinite());
        assert_relative_eq!(g.min_distance(v(&g, 3), v(&g, 3)), 0.0);
    }

    /// Floyd-Warshall reference over the same graph.
    fn all_pairs(points: &[[f64; 3]], edges: &[(usize, usize)]) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut d = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for &(a, b) in edges {
            let pa = Point3::from(points[a]);
            let pb = Point3::from(points[b]);
            let len = (pb - pa).norm();
            if len < d[a][b] {
                d[a][b] = len;
                d[b][a] = len;
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if d[i][k] + d[k][j] < d[i][j] {
                        d[i][j] = d[i][k] + d[k][j];
                    }
                }
            }
        }
        d
    }

    proptest! {
        #[test]
        fn symmetric_and_shortest(
            points in prop::collection::vec(prop::array::uniform3(-1.0e6..1.0e6f64), 2..9),
            raw_edges in prop::collection::vec((0usize..9, 0usize..9), 0..20),
        ) {
            let n = points.len();
            let mut edges: Vec<(usize, usize)> = raw_edges
                .into_iter()
                .map(|(a, b)| (a % n, b % n))
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect();
            edges.sort_unstable();
            edges.dedup();

            let labelled: Vec<(u32, [f64; 3])> = points
                .iter()
                .enumerate()
                .map(|(i, p)| (u32::try_from(i).unwrap(), *p))
                .collect();
            let labelled_edges: Vec<(u32, u32)> = edges
                .iter()
                .map(|&(a, b)| (u32::try_from(a).unwrap(), u32::try_from(b).unwrap()))
                .collect();
            let g = graph(&labelled, &labelled_edges);
            let reference = all_pairs(&points, &edges);

            for i in 0..n {
                for j in 0..n {
                    let a = v(&g, u32::try_from(i).unwrap());
                    let b = v(&g, u32::try_from(j).unwrap());
                    let ab = g.min_distance(a, b);
                    prop_assert_eq!(ab.to_bits(), g.min_distance(b, a).to_bits());
                    if reference[i][j].is_infinite() {
                        prop_assert!(ab.is_infinite());
                    } else {
                        prop_assert!((ab - reference[i][j]).abs() <= 1e-6 * reference[i][j].max(1.0));
                    }
                }
            }
        }
    }
}
