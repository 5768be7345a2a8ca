//! Route command - shortest taxi route through a ground network.

use std::path::PathBuf;

use clap::Args;
use vfrtraffic::geo::SphericalEarth;
use vfrtraffic::ground::{GroundNetwork, NodeId, Path};

use crate::error::CliError;

/// Arguments for `vfrtraffic route`.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Ground network file
    #[arg(long)]
    pub network: PathBuf,

    /// Start node id, as written in the file
    #[arg(long)]
    pub from: u32,

    /// Destination node id
    #[arg(long, required_unless_present = "runway", conflicts_with = "runway")]
    pub to: Option<u32>,

    /// Route to this runway's threshold instead of a node
    #[arg(long)]
    pub runway: Option<String>,

    /// Stop at the hold short point before the threshold (with --runway)
    #[arg(long, requires = "runway")]
    pub hold_short: bool,
}

/// Find and print the route.
pub fn run(args: RouteArgs) -> Result<(), CliError> {
    let network = GroundNetwork::load(&args.network, &SphericalEarth)?;
    let from = lookup(&network, args.from)?;

    let path = match (&args.runway, args.to) {
        (Some(runway), _) if args.hold_short => network.path_to_hold_short(from, runway),
        (Some(runway), _) => network.path_to_runway_threshold(from, runway),
        (None, Some(to)) => network.shortest_path(from, lookup(&network, to)?),
        (None, None) => {
            return Err(CliError::InvalidArgument(
                "either --to or --runway is required".to_string(),
            ))
        }
    };

    for line in describe(&network, &path) {
        println!("{}", line);
    }
    Ok(())
}

fn lookup(network: &GroundNetwork, file_id: u32) -> Result<NodeId, CliError> {
    network
        .node_by_file_id(file_id)
        .ok_or_else(|| CliError::InvalidArgument(format!("no node with id {}", file_id)))
}

/// One line per node along the path, then the total length.
fn describe(network: &GroundNetwork, path: &Path) -> Vec<String> {
    if path.is_empty() {
        return vec!["No route found".to_string()];
    }
    let mut lines: Vec<String> = path
        .nodes()
        .map(|id| {
            let node = network.node(id);
            format!("  {:>6}  {:<20} {}", node.file_id, node.name, node.kind.description())
        })
        .collect();
    lines.push(format!("Total: {:.0} m over {} nodes", path.cost_m(), lines.len()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = "\
N 1 -122.5000 37.5130 20 H 30 \"hold30\"
N 2 -122.5010 37.5130 20 J - \"rwy 30\"
N 3 -122.4990 37.5130 20 J - \"A1\"
N 4 -122.4900 37.5200 20 J - \"island\"
A 1 2 R N \"30\"
A 1 3 T N \"A\"
G 10 -122.4980 37.5130 20 A 90 \"Ramp 1\"
A 3 10 T N \"ramp\"
[End]
";

    fn network() -> GroundNetwork {
        GroundNetwork::parse(NETWORK, &SphericalEarth).unwrap()
    }

    #[test]
    fn test_describe_route_to_threshold() {
        let net = network();
        let from = net.node_by_file_id(10).unwrap();
        let path = net.path_to_runway_threshold(from, "30");
        let lines = describe(&net, &path);

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("Ramp 1"));
        assert!(lines[3].contains("rwy 30"));
        assert!(lines[4].starts_with("Total:"));
    }

    #[test]
    fn test_describe_unreachable() {
        let net = network();
        let from = net.node_by_file_id(10).unwrap();
        let to = net.node_by_file_id(4).unwrap();
        let lines = describe(&net, &net.shortest_path(from, to));
        assert_eq!(lines, vec!["No route found".to_string()]);
    }

    #[test]
    fn test_lookup_unknown_node() {
        let net = network();
        assert!(matches!(
            lookup(&net, 99),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
