//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input (a JSON graph, or a node and
//! an edge table), the output path, configuration file selection, the engine
//! deadline, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Trellis layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input graph description (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Edge table (CSV); when given, the input is read as the node table
    #[arg(long, value_name = "EDGES_CSV")]
    pub edges: Option<String>,

    /// Path to the output JSON file
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Seconds to wait for the layout engine; overrides the configuration
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Check the engine's result for missing nodes, edges or geometry
    #[arg(long)]
    pub verify: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["trellis", "graph.json"]);

        assert_eq!(args.input, "graph.json");
        assert!(args.edges.is_none());
        assert_eq!(args.output, "out.json");
        assert!(args.config.is_none());
        assert!(args.timeout.is_none());
        assert!(!args.verify);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "trellis",
            "graph.json",
            "-o",
            "laid-out.json",
            "-c",
            "trellis.toml",
            "--timeout",
            "2.5",
            "--verify",
            "--log-level",
            "debug",
        ]);

        assert_eq!(args.output, "laid-out.json");
        assert_eq!(args.config.as_deref(), Some("trellis.toml"));
        assert_eq!(args.timeout, Some(2.5));
        assert!(args.verify);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_flat_file_input() {
        let args = Args::parse_from(["trellis", "nodes.csv", "--edges", "edges.csv"]);

        assert_eq!(args.input, "nodes.csv");
        assert_eq!(args.edges.as_deref(), Some("edges.csv"));
    }
}
