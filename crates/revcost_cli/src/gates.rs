//! `revcost gates`: elementary gate totals and T-count per operation.

use revcost_config::ResolvedOp;
use revcost_decompose::DecompositionRules;
use revcost_diagnostics::DiagnosticSink;
use revcost_resource::{gate_counts_with, GateCounts};
use serde_json::{json, Map, Value};

use crate::pipeline::{load_project, options, render_diagnostics, select_ops};
use crate::{GatesArgs, GlobalArgs, ReportFormat};

/// Runs the `revcost gates` command.
pub fn run(args: &GatesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let ops = select_ops(&config, &args.ops)?;
    let sink = DiagnosticSink::new();
    let totals = cost_ops(&ops, &sink)?;

    match args.format {
        ReportFormat::Text => print!("{}", render_text(&ops, &totals)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&ops, &totals))?),
    }

    render_diagnostics(&sink, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Gate counts for each operation, honoring its depth and parallelism settings.
pub fn cost_ops(ops: &[ResolvedOp], sink: &DiagnosticSink) -> Result<Vec<GateCounts>, Box<dyn std::error::Error>> {
    ops.iter()
        .map(|op| Ok(gate_counts_with(&op.bloq, &DecompositionRules, options(&op.costing), sink)?))
        .collect()
}

/// Human-readable report: each operation, its gate totals and T-count.
pub fn render_text(ops: &[ResolvedOp], totals: &[GateCounts]) -> String {
    let mut out = String::new();
    for (op, counts) in ops.iter().zip(totals) {
        out.push_str(&format!("{}: {}\n", op.name, op.bloq));
        out.push_str(&format!("  {counts}\n"));
        out.push_str(&format!("  t_count: {}\n", counts.total_t_count()));
    }
    out
}

/// JSON report keyed by operation name; counts are rendered as expressions.
pub fn render_json(ops: &[ResolvedOp], totals: &[GateCounts]) -> Value {
    let mut report = Map::new();
    for (op, counts) in ops.iter().zip(totals) {
        let gates: Map<String, Value> = counts
            .as_map()
            .into_iter()
            .map(|(name, n)| (name.to_string(), Value::String(n.to_string())))
            .collect();
        report.insert(
            op.name.clone(),
            json!({
                "bloq": op.bloq.to_string(),
                "gates": gates,
                "t_count": counts.total_t_count().to_string(),
            }),
        );
    }
    Value::Object(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::{global_for, project_dir};

    fn costed(names: &[&str], bind: &[&str]) -> (Vec<ResolvedOp>, Vec<GateCounts>) {
        let dir = project_dir();
        let mut global = global_for(dir.path());
        global.bind = bind.iter().map(|s| s.to_string()).collect();
        let config = load_project(&global).unwrap();
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let ops = select_ops(&config, &names).unwrap();
        let totals = cost_ops(&ops, &DiagnosticSink::new()).unwrap();
        (ops, totals)
    }

    #[test]
    fn symbolic_t_count() {
        let (ops, totals) = costed(&["adder"], &[]);
        let text = render_text(&ops, &totals);
        assert!(text.contains("  t_count: 4*n - 4\n"));
    }

    #[test]
    fn bound_t_count() {
        let (_, totals) = costed(&["adder"], &["n=8"]);
        assert_eq!(totals[0].total_t_count().to_string(), "28");
    }

    #[test]
    fn depth_limited_op_still_costs() {
        let (mut ops, full) = costed(&["mul"], &[]);
        ops[0].costing.max_depth = Some(1);
        let limited = cost_ops(&ops, &DiagnosticSink::new()).unwrap();
        assert_eq!(limited, full);
        assert_eq!(limited[0].toffoli.to_string(), "16");
    }

    #[test]
    fn json_has_gates_and_t_count() {
        let (ops, totals) = costed(&["mul"], &[]);
        let json = render_json(&ops, &totals);
        assert_eq!(json["mul"]["gates"]["toffoli"], "16");
        assert_eq!(json["mul"]["t_count"], "64");
    }
}
