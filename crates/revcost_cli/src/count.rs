//! `revcost count`: leaf counts of each operation's call graph.
//!
//! The configured costing settings are resolved per operation and then
//! overridden by the command-line flags. Diagnostics raised during expansion
//! (upper bounds, symbolic leaves) are rendered after the report.

use revcost_config::{CostingConfig, ResolvedOp};
use revcost_decompose::DecompositionRules;
use revcost_diagnostics::DiagnosticSink;
use revcost_resource::{build_call_graph, CallGraph, CountMap};
use serde_json::{json, Map, Value};

use crate::pipeline::{build_generalizer, generalizer_names, load_project, options, render_diagnostics, select_ops};
use crate::{CountArgs, GlobalArgs, ReportFormat};

/// One operation's expansion.
pub struct OpCount {
    /// The resolved operation.
    pub op: ResolvedOp,
    /// Its call graph.
    pub graph: CallGraph,
    /// Leaf multiplicities.
    pub sigma: CountMap,
}

/// Runs the `revcost count` command.
pub fn run(args: &CountArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let ops = select_ops(&config, &args.ops)?;
    let sink = DiagnosticSink::new();
    let counted = count_ops(ops, args, &sink)?;

    if args.dot {
        for c in &counted {
            print!("{}", c.graph.to_dot());
        }
    } else {
        match args.format {
            ReportFormat::Text => print!("{}", render_text(&counted)),
            ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&counted))?),
        }
    }

    render_diagnostics(&sink, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Command-line flags layered over an operation's resolved settings.
pub fn apply_overrides(costing: &CostingConfig, args: &CountArgs) -> CostingConfig {
    CostingConfig {
        max_depth: args.depth.or(costing.max_depth),
        parallel: args.parallel || costing.parallel,
        generalizers: costing.generalizers.clone(),
    }
}

/// Expands every operation.
pub fn count_ops(
    ops: Vec<ResolvedOp>,
    args: &CountArgs,
    sink: &DiagnosticSink,
) -> Result<Vec<OpCount>, Box<dyn std::error::Error>> {
    let mut counted = Vec::with_capacity(ops.len());
    for op in ops {
        let costing = apply_overrides(&op.costing, args);
        let names: Vec<&str> = if args.generalizer.is_empty() {
            generalizer_names(&costing.generalizers)
        } else {
            args.generalizer.iter().map(String::as_str).collect()
        };
        let generalizer = build_generalizer(&names)?;
        tracing::debug!(op = %op.name, depth = ?costing.max_depth, generalizers = names.len(), "counting");
        let (graph, sigma) = build_call_graph(&op.bloq, &DecompositionRules, &generalizer, options(&costing), sink)?;
        counted.push(OpCount { op, graph, sigma });
    }
    Ok(counted)
}

/// Human-readable report: each operation followed by its indented leaves.
pub fn render_text(counted: &[OpCount]) -> String {
    let mut out = String::new();
    for c in counted {
        out.push_str(&format!("{}: {}\n", c.op.name, c.op.bloq));
        if c.sigma.is_empty() {
            out.push_str("  (no leaves)\n");
        }
        for (leaf, n) in &c.sigma {
            out.push_str(&format!("  {leaf}: {n}\n"));
        }
    }
    out
}

/// JSON report keyed by operation name; counts are rendered as expressions.
pub fn render_json(counted: &[OpCount]) -> Value {
    let mut ops = Map::new();
    for c in counted {
        let leaves: Map<String, Value> = c
            .sigma
            .iter()
            .map(|(leaf, n)| (leaf.to_string(), Value::String(n.to_string())))
            .collect();
        ops.insert(
            c.op.name.clone(),
            json!({
                "bloq": c.op.bloq.to_string(),
                "nodes": c.graph.node_count(),
                "leaves": leaves,
            }),
        );
    }
    Value::Object(ops)
}
