//! revcost CLI: cost and inspect the operations of a `revcost.toml` project.
//!
//! `revcost list` shows the configured operations, `revcost count` prints the
//! leaf counts of their call graphs, `revcost gates` the elementary gate totals
//! and T-count, and `revcost decompose` one level of decomposition, optionally
//! checked by simulation against the arithmetic it implements.

#![warn(missing_docs)]

mod count;
mod decompose;
mod gates;
mod list;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// revcost: symbolic gate counts for reversible arithmetic.
#[derive(Parser, Debug)]
#[command(name = "revcost", version, about = "Reversible arithmetic cost estimator")]
pub struct Cli {
    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `revcost.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Bind a symbol for this run, e.g. `--bind n=64`. Overrides `[bindings]`.
    #[arg(long, global = true, value_name = "SYMBOL=VALUE")]
    pub bind: Vec<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the operations defined in the project.
    List,
    /// Print the leaf counts of each operation's call graph.
    Count(CountArgs),
    /// Print elementary gate counts and the T-count.
    Gates(GatesArgs),
    /// Show one level of an operation's decomposition.
    Decompose(DecomposeArgs),
}

/// Arguments for `revcost count`.
#[derive(Parser, Debug)]
pub struct CountArgs {
    /// Operations to count; all when omitted.
    pub ops: Vec<String>,

    /// Maximum expansion depth, overriding the configuration.
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Generalizers to apply, replacing the configured list.
    #[arg(short, long, num_args = 1..)]
    pub generalizer: Vec<String>,

    /// Expand each level in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Print the call graph in Graphviz DOT format instead of counts.
    #[arg(long)]
    pub dot: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `revcost gates`.
#[derive(Parser, Debug)]
pub struct GatesArgs {
    /// Operations to cost; all when omitted.
    pub ops: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `revcost decompose`.
#[derive(Parser, Debug)]
pub struct DecomposeArgs {
    /// Operation to decompose.
    pub op: String,

    /// Check the decomposition against the operation's arithmetic on every
    /// input pattern.
    #[arg(long)]
    pub verify: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
    /// Extra `SYMBOL=VALUE` bindings.
    pub bind: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    pipeline::init_tracing(cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        bind: cli.bind,
    };

    let result = match cli.command {
        Command::List => list::run(&global),
        Command::Count(ref args) => count::run(args, &global),
        Command::Gates(ref args) => gates::run(args, &global),
        Command::Decompose(ref args) => decompose::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let cli = Cli::parse_from(["revcost", "list"]);
        assert!(matches!(cli.command, Command::List));
        assert!(!cli.quiet);
        assert!(cli.bind.is_empty());
    }

    #[test]
    fn parse_count_default() {
        let cli = Cli::parse_from(["revcost", "count"]);
        match cli.command {
            Command::Count(ref args) => {
                assert!(args.ops.is_empty());
                assert!(args.depth.is_none());
                assert!(args.generalizer.is_empty());
                assert!(!args.parallel);
                assert!(!args.dot);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Count command"),
        }
    }

    #[test]
    fn parse_count_with_args() {
        let cli = Cli::parse_from([
            "revcost",
            "count",
            "adder",
            "mul",
            "--depth",
            "2",
            "--generalizer",
            "ignore-split-join",
            "generalize-cvs",
            "--parallel",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Count(ref args) => {
                assert_eq!(args.ops, vec!["adder", "mul"]);
                assert_eq!(args.depth, Some(2));
                assert_eq!(args.generalizer, vec!["ignore-split-join", "generalize-cvs"]);
                assert!(args.parallel);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Count command"),
        }
    }

    #[test]
    fn parse_gates() {
        let cli = Cli::parse_from(["revcost", "gates", "mul", "-f", "json"]);
        match cli.command {
            Command::Gates(ref args) => {
                assert_eq!(args.ops, vec!["mul"]);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Gates command"),
        }
    }

    #[test]
    fn parse_decompose() {
        let cli = Cli::parse_from(["revcost", "decompose", "adder", "--verify"]);
        match cli.command {
            Command::Decompose(ref args) => {
                assert_eq!(args.op, "adder");
                assert!(args.verify);
            }
            _ => panic!("expected Decompose command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "revcost",
            "--quiet",
            "--color",
            "never",
            "--bind",
            "n=8",
            "--bind",
            "m=4",
            "--config",
            "/path/to/revcost.toml",
            "list",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.bind, vec!["n=8", "m=4"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/revcost.toml"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["revcost", "gates", "--verbose", "--bind", "n=3"]);
        assert!(cli.verbose);
        assert_eq!(cli.bind, vec!["n=3"]);
    }
}
