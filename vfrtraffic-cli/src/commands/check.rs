//! Check command - load a ground network and summarize it.

use std::path::PathBuf;

use clap::Args;
use vfrtraffic::geo::SphericalEarth;
use vfrtraffic::ground::GroundNetwork;

use crate::error::CliError;

/// Arguments for `vfrtraffic check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Ground network file
    #[arg(long)]
    pub network: PathBuf,
}

/// Validate the file and print a summary.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let network = GroundNetwork::load(&args.network, &SphericalEarth)?;
    println!("{}: OK", args.network.display());
    for line in summarize(&network) {
        println!("{}", line);
    }
    Ok(())
}

fn summarize(network: &GroundNetwork) -> Vec<String> {
    let mut lines = vec![
        format!("  Nodes: {}", network.node_count()),
        format!("  Arcs:  {}", network.arc_count()),
        format!("  Gates: {}", network.gates().len()),
    ];

    let runways: Vec<u32> = network.exit_runways().collect();
    if runways.is_empty() {
        lines.push("  No runway exits".to_string());
    }
    for number in runways {
        let ident = format!("{:02}", number);
        let threshold = match network.threshold_node(&ident) {
            Some(id) => format!("threshold node {}", network.node(id).file_id),
            None => "no threshold node".to_string(),
        };
        lines.push(format!(
            "  Runway {}: {} exits, {}",
            ident,
            network.exits(&ident).len(),
            threshold
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const NETWORK: &str = "\
N 1 -122.5000 37.5130 20 H 30 \"hold30\"
N 2 -122.5010 37.5130 20 J - \"rwy 30\"
N 3 -122.4990 37.5130 20 H 12 \"hold12\"
A 1 2 R N \"30\"
A 1 3 T N \"A\"
G 10 -122.4980 37.5130 20 A 90 \"Ramp 1\"
A 3 10 T N \"ramp\"
[End]
";

    #[test]
    fn test_summary_lists_runways() {
        let net = GroundNetwork::parse(NETWORK, &SphericalEarth).unwrap();
        let lines = summarize(&net);

        assert_eq!(lines[0], "  Nodes: 4");
        assert_eq!(lines[1], "  Arcs:  3");
        assert_eq!(lines[2], "  Gates: 1");
        assert_eq!(lines[3], "  Runway 12: 1 exits, no threshold node");
        assert_eq!(lines[4], "  Runway 30: 1 exits, threshold node 2");
    }

    #[test]
    fn test_run_reports_load_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "A 1 2 T N \"dangling\"\n[End]\n").unwrap();

        let result = run(CheckArgs { network: path });
        assert!(matches!(result, Err(CliError::Network(_))));
    }
}
