//! Taxiway network and route finding.
//!
//! A [`GroundNetwork`] is loaded once per airport from a line-oriented
//! record file and never changes afterwards. Routes are computed on
//! demand by [`GroundNetwork::shortest_path`] and its threshold and hold
//! short variants.
//!
//! # Example
//!
//! ```ignore
//! let network = GroundNetwork::load(path, &SphericalEarth)?;
//! let gate = network.gates()[0];
//! let route = network.path_to_hold_short(gate, "25");
//! if route.is_empty() {
//!     // no route: fall back to a synthetic waypoint
//! }
//! ```

mod error;
mod network;
mod parser;
mod path;

pub use error::LoadError;
pub use network::{
    ArcId, ArcKind, GateInfo, GroundArc, GroundNetwork, GroundNode, NodeId, NodeKind,
};
pub use parser::{parse_records, ArcRecord, GateRecord, NetworkRecord, NodeRecord};
pub use path::{Path, PathElement};
