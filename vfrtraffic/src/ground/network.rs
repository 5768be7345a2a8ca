//! Immutable taxiway graph.
//!
//! # Design
//!
//! Nodes and arcs live in two arenas owned by [`GroundNetwork`] and are
//! addressed by [`NodeId`] / [`ArcId`] indices. Each arc stores its two
//! endpoint ids and is listed on both endpoints. Nothing is mutated after
//! the build, so a network can be shared behind an `Arc` by every
//! controller and aircraft at the airport.
//!
//! Runtime state such as gate occupancy is kept by the ground controller,
//! never in the graph.

use std::collections::{BTreeMap, HashMap};
use std::path::Path as FsPath;

use serde::Serialize;
use tracing::{debug, info};

use crate::geo::{GeoPoint, Geodesy};
use crate::runway::runway_number;

use super::error::LoadError;
use super::parser::{parse_records, NetworkRecord};

/// Index of a node in the network arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of an arc in the network arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArcId(usize);

impl ArcId {
    /// Arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Kind of taxiway graph vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Junction,
    TJunction,
    Hold,
    Gate,
    Apron,
}

impl NodeKind {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            NodeKind::Junction => "taxiway junction",
            NodeKind::TJunction => "taxiway T-junction",
            NodeKind::Hold => "hold short point",
            NodeKind::Gate => "parking gate",
            NodeKind::Apron => "apron",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Junction => write!(f, "J"),
            NodeKind::TJunction => write!(f, "T"),
            NodeKind::Hold => write!(f, "H"),
            NodeKind::Gate => write!(f, "G"),
            NodeKind::Apron => write!(f, "P"),
        }
    }
}

/// Kind of taxiway graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArcKind {
    Runway,
    Taxiway,
}

/// Parking details carried by gate nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateInfo {
    /// Sequential gate number in file order, starting at zero.
    pub number: usize,
    /// Capacity class code as written in the file.
    pub type_code: String,
    /// Heading an aircraft takes when parked.
    pub heading_deg: f64,
}

/// A taxiway graph vertex.
#[derive(Debug, Clone, Serialize)]
pub struct GroundNode {
    pub id: NodeId,
    /// Id as declared in the network file.
    pub file_id: u32,
    pub position: GeoPoint,
    pub kind: NodeKind,
    pub name: String,
    /// Arcs incident on this node, in file order.
    pub arcs: Vec<ArcId>,
    /// Set for gate nodes only.
    pub gate: Option<GateInfo>,
}

impl GroundNode {
    /// Whether this node is a parking gate.
    pub fn is_gate(&self) -> bool {
        self.kind == NodeKind::Gate
    }
}

/// A taxiway graph edge.
#[derive(Debug, Clone, Serialize)]
pub struct GroundArc {
    pub id: ArcId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: ArcKind,
    /// Directed arcs may only be traversed from `from` to `to`.
    pub directed: bool,
    /// Horizontal separation of the endpoints, fixed at load.
    pub distance_m: f64,
    pub name: String,
}

impl GroundArc {
    /// Node reached by traversing this arc from `node`, if allowed.
    ///
    /// Returns `None` when `node` is not an endpoint or when the arc is
    /// directed the other way.
    #[inline]
    pub fn traverse_from(&self, node: NodeId) -> Option<NodeId> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node && !self.directed {
            Some(self.from)
        } else {
            None
        }
    }

    /// Whether both endpoints are the same node.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// The loaded taxiway network of one airport.
#[derive(Debug, Clone, Default)]
pub struct GroundNetwork {
    nodes: Vec<GroundNode>,
    arcs: Vec<GroundArc>,
    by_file_id: HashMap<u32, NodeId>,
    gates: Vec<NodeId>,
    exits: BTreeMap<u32, Vec<NodeId>>,
}

impl GroundNetwork {
    /// Load and build a network from a file.
    pub fn load(path: &FsPath, geodesy: &dyn Geodesy) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let network = Self::parse(&text, geodesy)?;
        info!(
            path = %path.display(),
            nodes = network.node_count(),
            arcs = network.arc_count(),
            gates = network.gates.len(),
            "Loaded ground network"
        );
        Ok(network)
    }

    /// Parse and build a network from file text.
    pub fn parse(text: &str, geodesy: &dyn Geodesy) -> Result<Self, LoadError> {
        Self::from_records(parse_records(text)?, geodesy)
    }

    /// Build a network from parsed records.
    ///
    /// Nodes and gates are placed first so arcs may reference nodes
    /// declared later in the file. Any arc naming an undeclared node
    /// fails the whole build.
    pub fn from_records(
        records: Vec<NetworkRecord>,
        geodesy: &dyn Geodesy,
    ) -> Result<Self, LoadError> {
        let mut network = GroundNetwork::default();
        let mut arc_records = Vec::new();

        for record in records {
            match record {
                NetworkRecord::Node(node) => {
                    let id = network.insert_node(
                        node.line,
                        node.id,
                        node.position,
                        node.kind,
                        node.name,
                        None,
                    )?;
                    for rwy in node.exits {
                        network.exits.entry(rwy).or_default().push(id);
                    }
                }
                NetworkRecord::Gate(gate) => {
                    let info = GateInfo {
                        number: network.gates.len(),
                        type_code: gate.type_code,
                        heading_deg: gate.heading_deg,
                    };
                    let id = network.insert_node(
                        gate.line,
                        gate.id,
                        gate.position,
                        NodeKind::Gate,
                        gate.name,
                        Some(info),
                    )?;
                    network.gates.push(id);
                }
                NetworkRecord::Arc(arc) => arc_records.push(arc),
            }
        }

        for arc in arc_records {
            let from = network.resolve(arc.line, arc.from)?;
            let to = network.resolve(arc.line, arc.to)?;
            let id = ArcId(network.arcs.len());
            let distance_m = geodesy.distance_m(
                &network.nodes[from.0].position,
                &network.nodes[to.0].position,
            );

            network.arcs.push(GroundArc {
                id,
                from,
                to,
                kind: arc.kind,
                directed: arc.directed,
                distance_m,
                name: arc.name,
            });
            network.nodes[from.0].arcs.push(id);
            if to != from {
                network.nodes[to.0].arcs.push(id);
            }
        }

        debug!(
            nodes = network.nodes.len(),
            arcs = network.arcs.len(),
            exits = network.exits.len(),
            "Built ground network"
        );
        Ok(network)
    }

    fn insert_node(
        &mut self,
        line: usize,
        file_id: u32,
        position: GeoPoint,
        kind: NodeKind,
        name: String,
        gate: Option<GateInfo>,
    ) -> Result<NodeId, LoadError> {
        if self.by_file_id.contains_key(&file_id) {
            return Err(LoadError::DuplicateNode { line, id: file_id });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(GroundNode {
            id,
            file_id,
            position,
            kind,
            name,
            arcs: Vec::new(),
            gate,
        });
        self.by_file_id.insert(file_id, id);
        Ok(id)
    }

    fn resolve(&self, line: usize, file_id: u32) -> Result<NodeId, LoadError> {
        self.by_file_id
            .get(&file_id)
            .copied()
            .ok_or(LoadError::UnknownNode { line, id: file_id })
    }

    /// Node by arena id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this network.
    pub fn node(&self, id: NodeId) -> &GroundNode {
        &self.nodes[id.0]
    }

    /// Arc by arena id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this network.
    pub fn arc(&self, id: ArcId) -> &GroundArc {
        &self.arcs[id.0]
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[GroundNode] {
        &self.nodes
    }

    /// All arcs in arena order.
    pub fn arcs(&self) -> &[GroundArc] {
        &self.arcs
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Look up a node by the id declared in the file.
    pub fn node_by_file_id(&self, file_id: u32) -> Option<NodeId> {
        self.by_file_id.get(&file_id).copied()
    }

    /// Gate nodes in gate-number order.
    pub fn gates(&self) -> &[NodeId] {
        &self.gates
    }

    /// Runway numbers that have at least one exit.
    pub fn exit_runways(&self) -> impl Iterator<Item = u32> + '_ {
        self.exits.keys().copied()
    }

    /// Exit nodes for a runway.
    ///
    /// Only the leading digits of `runway_id` are used, so `07L` and `07R`
    /// share the exits listed for runway 7.
    pub fn exits(&self, runway_id: &str) -> &[NodeId] {
        runway_number(runway_id)
            .and_then(|n| self.exits.get(&n))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find the threshold node of a runway.
    ///
    /// Threshold nodes are named `rwy <ident>`: the name starts with `rwy`
    /// and its text from the fifth character on equals the ident.
    pub fn threshold_node(&self, runway_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| {
                node.name.starts_with("rwy") && node.name.get(4..) == Some(runway_id)
            })
            .map(|node| node.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::SphericalEarth;

    const SAMPLE: &str = r#"
N 1 -118.0300 34.0800 90 H 19 "rwy 19"
N 2 -118.0300 34.0810 90 H - "hold 19"
N 3 -118.0310 34.0810 90 J 01-19 "Alpha"
G 10 -118.0320 34.0810 90 1 90 "Gate A"
G 11 -118.0320 34.0812 90 1 90 "Gate B"
A 2 1 T N "to rwy"
A 3 2 T N "Alpha"
A 10 3 T N "apron A"
A 11 3 T N "apron B"
A 3 3 T N "loop"
[End]
"#;

    fn network() -> GroundNetwork {
        GroundNetwork::parse(SAMPLE, &SphericalEarth).unwrap()
    }

    #[test]
    fn test_build_counts_and_gate_numbers() {
        let net = network();
        assert_eq!(net.node_count(), 5);
        assert_eq!(net.arc_count(), 5);
        assert_eq!(net.gates().len(), 2);

        let gate_b = net.node(net.gates()[1]);
        assert!(gate_b.is_gate());
        assert_eq!(gate_b.gate.as_ref().map(|g| g.number), Some(1));
        assert_eq!(gate_b.name, "Gate B");
    }

    #[test]
    fn test_arcs_attached_to_both_endpoints() {
        let net = network();
        let alpha = net.node_by_file_id(3).unwrap();
        // hold arc, two apron arcs, and the self loop once
        assert_eq!(net.node(alpha).arcs.len(), 4);

        let arc = net.arc(net.node(alpha).arcs[0]);
        // 0.001 degrees of longitude at 34 degrees north
        assert!(arc.distance_m > 85.0 && arc.distance_m < 100.0, "{}", arc.distance_m);
    }

    #[test]
    fn test_threshold_node_by_name() {
        let net = network();
        assert_eq!(net.threshold_node("19"), net.node_by_file_id(1));
        assert_eq!(net.threshold_node("01"), None);
    }

    #[test]
    fn test_exits_use_runway_number() {
        let net = network();
        assert_eq!(net.exits("19").len(), 2);
        assert_eq!(net.exits("19R").len(), 2);
        assert_eq!(net.exits("1").len(), 1);
        assert!(net.exits("25").is_empty());
        assert_eq!(net.exit_runways().collect::<Vec<_>>(), vec![1, 19]);
    }

    #[test]
    fn test_directed_arc_traversal() {
        let arc = GroundArc {
            id: ArcId(0),
            from: NodeId(0),
            to: NodeId(1),
            kind: ArcKind::Taxiway,
            directed: true,
            distance_m: 10.0,
            name: String::new(),
        };
        assert_eq!(arc.traverse_from(NodeId(0)), Some(NodeId(1)));
        assert_eq!(arc.traverse_from(NodeId(1)), None);
        assert_eq!(arc.traverse_from(NodeId(2)), None);

        let undirected = GroundArc {
            directed: false,
            ..arc
        };
        assert_eq!(undirected.traverse_from(NodeId(1)), Some(NodeId(0)));
    }

    #[test]
    fn test_arc_to_missing_node_fails_whole_load() {
        let text = "N 1 0 0 0 J - \"a\"\nA 1 7 T N \"dangling\"\n";
        let err = GroundNetwork::parse(text, &SphericalEarth).unwrap_err();
        assert!(matches!(err, LoadError::UnknownNode { line: 2, id: 7 }));
    }

    #[test]
    fn test_arcs_may_precede_their_nodes() {
        let text = "A 1 2 T N \"x\"\nN 1 0 0 0 J - \"a\"\nN 2 0 0.001 0 J - \"b\"\n";
        let net = GroundNetwork::parse(text, &SphericalEarth).unwrap();
        assert_eq!(net.arc_count(), 1);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let text = "N 1 0 0 0 J - \"a\"\nG 1 0 0 0 1 0 \"g\"\n";
        let err = GroundNetwork::parse(text, &SphericalEarth).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateNode { line: 2, id: 1 }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GroundNetwork::load(&dir.path().join("none.taxi"), &SphericalEarth).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.taxi");
        std::fs::write(&path, SAMPLE).unwrap();
        let net = GroundNetwork::load(&path, &SphericalEarth).unwrap();
        assert_eq!(net.node_count(), 5);
    }
}
