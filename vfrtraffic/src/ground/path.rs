//! Shortest taxi routes.
//!
//! # Algorithm
//!
//! Label-correcting search with a FIFO frontier:
//!
//! ```text
//! pop node n
//!   skip if a solution exists and label(n) >= best
//!   for each arc leaving n (self loops ignored):
//!     if label(n) + d < label(m): relabel m, push m
//!       if m is the destination: record new best path
//! until the frontier is empty
//! ```
//!
//! A node is re-queued whenever a cheaper label reaches it, so the
//! result is optimal for non-negative arc lengths.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::warn;

use super::network::{ArcId, GroundNetwork, NodeId};

/// One step of a taxi route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathElement {
    Node(NodeId),
    Arc(ArcId),
}

/// An alternating node/arc route with its total length.
///
/// An empty path means no route was found.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Path {
    elements: Vec<PathElement>,
    cost_m: f64,
}

impl Path {
    /// The "no route" path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A route consisting of a single node.
    pub fn single(node: NodeId) -> Self {
        Self {
            elements: vec![PathElement::Node(node)],
            cost_m: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Total length in metres.
    pub fn cost_m(&self) -> f64 {
        self.cost_m
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// The node ids along the route, arcs skipped.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.elements.iter().filter_map(|e| match e {
            PathElement::Node(n) => Some(*n),
            PathElement::Arc(_) => None,
        })
    }

    /// Last node of the route.
    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes().last()
    }

    /// Drop `count` trailing elements, recomputing the cost.
    ///
    /// Removing more elements than the path holds, or leaving only a
    /// dangling arc, yields the empty path.
    pub fn trim_tail(&self, count: usize, network: &GroundNetwork) -> Path {
        if count >= self.elements.len() {
            return Path::empty();
        }
        let elements: Vec<PathElement> =
            self.elements[..self.elements.len() - count].to_vec();
        if !matches!(elements.last(), Some(PathElement::Node(_))) {
            return Path::empty();
        }
        Path::from_elements(elements, network)
    }

    /// Drop the first node and the arc following it.
    pub fn without_start(&self, network: &GroundNetwork) -> Path {
        if self.elements.len() < 3 {
            return Path::empty();
        }
        Path::from_elements(self.elements[2..].to_vec(), network)
    }

    fn from_elements(elements: Vec<PathElement>, network: &GroundNetwork) -> Path {
        let cost_m = elements
            .iter()
            .map(|e| match e {
                PathElement::Arc(a) => network.arc(*a).distance_m,
                PathElement::Node(_) => 0.0,
            })
            .sum();
        Path { elements, cost_m }
    }
}

/// Best known route to a node during the search.
#[derive(Debug, Clone, Copy)]
struct Label {
    cost: f64,
    via: Option<(NodeId, ArcId)>,
}

impl GroundNetwork {
    /// Shortest route between two nodes, or an empty path if unreachable.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Path {
        if from.index() >= self.node_count() || to.index() >= self.node_count() {
            return Path::empty();
        }
        if from == to {
            return Path::single(from);
        }

        let mut labels: Vec<Option<Label>> = vec![None; self.node_count()];
        labels[from.index()] = Some(Label {
            cost: 0.0,
            via: None,
        });

        let mut frontier = VecDeque::from([from]);
        let mut best: Option<Path> = None;

        while let Some(node) = frontier.pop_front() {
            let Some(label) = labels[node.index()] else {
                continue;
            };
            if let Some(solution) = &best {
                if solution.cost_m <= label.cost {
                    continue;
                }
            }

            for &arc_id in &self.node(node).arcs {
                let arc = self.arc(arc_id);
                if arc.is_self_loop() {
                    continue;
                }
                let Some(next) = arc.traverse_from(node) else {
                    continue;
                };

                let cost = label.cost + arc.distance_m;
                let improved = match labels[next.index()] {
                    Some(existing) => cost < existing.cost,
                    None => true,
                };
                if !improved {
                    continue;
                }

                labels[next.index()] = Some(Label {
                    cost,
                    via: Some((node, arc_id)),
                });
                frontier.push_back(next);

                if next == to && best.as_ref().map_or(true, |b| cost < b.cost_m) {
                    best = Some(self.trace(&labels, to, cost));
                }
            }
        }

        best.unwrap_or_default()
    }

    /// Rebuild the route ending at `to` from predecessor labels.
    fn trace(&self, labels: &[Option<Label>], to: NodeId, cost: f64) -> Path {
        let mut elements = vec![PathElement::Node(to)];
        let mut current = to;

        // A route can never revisit a node, so this bounds the walk.
        for _ in 0..self.node_count() {
            match labels[current.index()].and_then(|l| l.via) {
                Some((prev, arc)) => {
                    elements.push(PathElement::Arc(arc));
                    elements.push(PathElement::Node(prev));
                    current = prev;
                }
                None => break,
            }
        }

        elements.reverse();
        Path {
            elements,
            cost_m: cost,
        }
    }

    /// Shortest route from a node to a runway's threshold node.
    pub fn path_to_runway_threshold(&self, from: NodeId, runway_id: &str) -> Path {
        match self.threshold_node(runway_id) {
            Some(threshold) => self.shortest_path(from, threshold),
            None => {
                warn!(runway = runway_id, "No threshold node for runway");
                Path::empty()
            }
        }
    }

    /// Route from a node to the hold short point of a runway.
    ///
    /// The threshold route with its final arc and node removed. This
    /// assumes the network models the hold short as exactly one arc
    /// before the threshold.
    pub fn path_to_hold_short(&self, from: NodeId, runway_id: &str) -> Path {
        self.path_to_runway_threshold(from, runway_id)
            .trim_tail(2, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Geodesy, SphericalEarth};

    //   1 ---- 2 ---- 3
    //   |             |
    //   4 ----------- 5
    //
    // plus 3 -- 6 (rwy 25) and an unconnected node 7.
    const GRID: &str = r#"
N 1 0.000 0.000 0 J - "n1"
N 2 0.001 0.000 0 J - "n2"
N 3 0.002 0.000 0 H - "hold 25"
N 4 0.000 -0.002 0 J - "n4"
N 5 0.002 -0.002 0 J - "n5"
N 6 0.002 0.001 0 J 25 "rwy 25"
N 7 0.010 0.010 0 J - "island"
A 1 2 T N "a"
A 2 3 T N "a"
A 1 4 T N "b"
A 4 5 T N "b"
A 5 3 T N "c"
A 3 6 T N "d"
A 7 7 T N "loop"
"#;

    fn grid() -> GroundNetwork {
        GroundNetwork::parse(GRID, &SphericalEarth).unwrap()
    }

    fn id(net: &GroundNetwork, file_id: u32) -> NodeId {
        net.node_by_file_id(file_id).unwrap()
    }

    fn file_ids(net: &GroundNetwork, path: &Path) -> Vec<u32> {
        path.nodes().map(|n| net.node(n).file_id).collect()
    }

    #[test]
    fn test_same_node_is_single_element_path() {
        let net = grid();
        let path = net.shortest_path(id(&net, 2), id(&net, 2));
        assert_eq!(path.len(), 1);
        assert_eq!(path.cost_m(), 0.0);
    }

    #[test]
    fn test_prefers_shorter_route() {
        let net = grid();
        let path = net.shortest_path(id(&net, 1), id(&net, 6));
        assert_eq!(file_ids(&net, &path), vec![1, 2, 3, 6]);
        assert_eq!(path.len(), 7);

        let alt: f64 = [(1, 4), (4, 5), (5, 3), (3, 6)]
            .iter()
            .map(|&(a, b)| {
                let a = net.node(id(&net, a)).position;
                let b = net.node(id(&net, b)).position;
                SphericalEarth.distance_m(&a, &b)
            })
            .sum();
        assert!(path.cost_m() <= alt);
    }

    #[test]
    fn test_elements_alternate_node_arc() {
        let net = grid();
        let path = net.shortest_path(id(&net, 4), id(&net, 2));
        for (i, element) in path.elements().iter().enumerate() {
            match element {
                PathElement::Node(_) => assert_eq!(i % 2, 0),
                PathElement::Arc(_) => assert_eq!(i % 2, 1),
            }
        }
    }

    #[test]
    fn test_unreachable_gives_empty_path() {
        let net = grid();
        let path = net.shortest_path(id(&net, 1), id(&net, 7));
        assert!(path.is_empty());
        assert_eq!(path.cost_m(), 0.0);
    }

    #[test]
    fn test_directed_arc_is_one_way() {
        let text = r#"
N 1 0.000 0.000 0 J - "a"
N 2 0.001 0.000 0 J - "b"
A 1 2 T Y "one way"
"#;
        let net = GroundNetwork::parse(text, &SphericalEarth).unwrap();
        let a = id(&net, 1);
        let b = id(&net, 2);
        assert!(!net.shortest_path(a, b).is_empty());
        assert!(net.shortest_path(b, a).is_empty());
    }

    #[test]
    fn test_threshold_and_hold_short_paths() {
        let net = grid();
        let to_threshold = net.path_to_runway_threshold(id(&net, 1), "25");
        assert_eq!(file_ids(&net, &to_threshold), vec![1, 2, 3, 6]);

        let to_hold = net.path_to_hold_short(id(&net, 1), "25");
        assert_eq!(file_ids(&net, &to_hold), vec![1, 2, 3]);
        assert_eq!(to_hold.len(), to_threshold.len() - 2);
        assert!(to_hold.cost_m() < to_threshold.cost_m());
    }

    #[test]
    fn test_missing_threshold_gives_empty_path() {
        let net = grid();
        assert!(net.path_to_runway_threshold(id(&net, 1), "07").is_empty());
        assert!(net.path_to_hold_short(id(&net, 1), "07").is_empty());
    }

    #[test]
    fn test_hold_short_from_threshold_neighbour_is_single_node() {
        let net = grid();
        let path = net.path_to_hold_short(id(&net, 3), "25");
        assert_eq!(file_ids(&net, &path), vec![3]);
        assert_eq!(path.cost_m(), 0.0);
        // starting on the threshold itself leaves nothing
        assert!(net.path_to_hold_short(id(&net, 6), "25").is_empty());
    }

    #[test]
    fn test_without_start() {
        let net = grid();
        let path = net.shortest_path(id(&net, 1), id(&net, 3));
        let rest = path.without_start(&net);
        assert_eq!(file_ids(&net, &rest), vec![2, 3]);
        assert!(Path::single(id(&net, 1)).without_start(&net).is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// Brute-force the cheapest simple path by depth-first enumeration.
        fn brute_force(net: &GroundNetwork, from: NodeId, to: NodeId) -> Option<f64> {
            fn walk(
                net: &GroundNetwork,
                at: NodeId,
                to: NodeId,
                cost: f64,
                seen: &mut Vec<NodeId>,
                best: &mut Option<f64>,
            ) {
                if at == to {
                    *best = Some(best.map_or(cost, |b: f64| b.min(cost)));
                    return;
                }
                for &arc_id in &net.node(at).arcs {
                    let arc = net.arc(arc_id);
                    if arc.is_self_loop() {
                        continue;
                    }
                    if let Some(next) = arc.traverse_from(at) {
                        if !seen.contains(&next) {
                            seen.push(next);
                            walk(net, next, to, cost + arc.distance_m, seen, best);
                            seen.pop();
                        }
                    }
                }
            }
            let mut best = None;
            walk(net, from, to, 0.0, &mut vec![from], &mut best);
            best
        }

        fn random_network(coords: &[(f64, f64)], edges: &[(usize, usize, bool)]) -> GroundNetwork {
            let mut text = String::new();
            for (i, (lon, lat)) in coords.iter().enumerate() {
                text.push_str(&format!("N {} {} {} 0 J - \"n{}\"\n", i, lon, lat, i));
            }
            for (a, b, directed) in edges {
                let a = a % coords.len();
                let b = b % coords.len();
                let d = if *directed { "Y" } else { "N" };
                text.push_str(&format!("A {} {} T {} \"e\"\n", a, b, d));
            }
            GroundNetwork::parse(&text, &SphericalEarth).unwrap()
        }

        proptest! {
            #[test]
            fn test_shortest_path_is_optimal(
                coords in prop::collection::vec((-0.01..0.01_f64, -0.01..0.01_f64), 2..7),
                edges in prop::collection::vec((0usize..7, 0usize..7, any::<bool>()), 0..14),
                from in 0usize..7,
                to in 0usize..7,
            ) {
                let net = random_network(&coords, &edges);
                let from = net.node_by_file_id((from % coords.len()) as u32).unwrap();
                let to = net.node_by_file_id((to % coords.len()) as u32).unwrap();

                let path = net.shortest_path(from, to);
                match brute_force(&net, from, to) {
                    Some(best) => {
                        prop_assert!(!path.is_empty());
                        prop_assert!((path.cost_m() - best).abs() < 1e-6);
                        prop_assert_eq!(path.nodes().next(), Some(from));
                        prop_assert_eq!(path.last_node(), Some(to));
                    }
                    None => prop_assert!(path.is_empty()),
                }

                // cost never decreases along the route
                let mut running = 0.0;
                for element in path.elements() {
                    if let PathElement::Arc(a) = element {
                        let d = net.arc(*a).distance_m;
                        prop_assert!(d >= 0.0);
                        running += d;
                    }
                }
                prop_assert!((running - path.cost_m()).abs() < 1e-6);
            }
        }
    }
}
