//! Conformance test helpers for revcost.
//!
//! Provides shared functions that run nodes through the full costing pipeline
//! (decompose → call graph → gate counts) or through simulation, and project
//! files through load → resolve → cost, returning structured results for
//! assertion in integration tests.

#![warn(missing_docs)]

use revcost_common::{gf2_poly, Bits, SymInt};
use revcost_config::{load_config_from_str, resolve_all, ConfigError};
use revcost_decompose::DecompositionRules;
use revcost_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use revcost_ir::Bloq;
use revcost_resource::{build_call_graph, gate_counts_with, CallGraphOptions, CountMap, GateCounts, Generalizer};
use revcost_sim::{simulate, values, Values};

/// Result of costing one node.
pub struct CostResult {
    /// Elementary gate totals.
    pub counts: GateCounts,
    /// All diagnostics emitted while expanding.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of costing every operation in a project file.
pub struct ProjectResult {
    /// `(name, node, counts)` for each operation, in name order.
    pub ops: Vec<(String, Bloq, GateCounts)>,
    /// All diagnostics emitted.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

/// Expands `bloq` to elementary gates and counts them.
pub fn full_cost(bloq: &Bloq) -> CostResult {
    let sink = DiagnosticSink::new();
    let counts = gate_counts_with(bloq, &DecompositionRules, CallGraphOptions::full(), &sink)
        .unwrap_or_else(|e| panic!("costing {bloq} failed: {e}"));
    CostResult {
        counts,
        diagnostics: sink.take_all(),
    }
}

/// T-count of the full expansion of `bloq`.
pub fn t_count(bloq: &Bloq) -> SymInt {
    full_cost(bloq).counts.total_t_count()
}

/// Leaf counts of `bloq` expanded to `options` with `generalizer`.
pub fn sigma(bloq: &Bloq, generalizer: &dyn Generalizer, options: CallGraphOptions) -> CountMap {
    let sink = DiagnosticSink::new();
    let (_, sigma) = build_call_graph(bloq, &DecompositionRules, generalizer, options, &sink)
        .unwrap_or_else(|e| panic!("expanding {bloq} failed: {e}"));
    sigma
}

/// Sum of all multiplicities in a count map.
pub fn total(sigma: &CountMap) -> SymInt {
    sigma.values().sum()
}

/// Simulates `bloq` on `(register, value, width)` triples.
pub fn run(bloq: &Bloq, inputs: &[(&str, u128, u32)]) -> Values {
    let ins = values(inputs.iter().map(|&(name, v, w)| (name, Bits::from_u128(v, w))));
    simulate(bloq, &ins).unwrap_or_else(|e| panic!("simulating {bloq} failed: {e}"))
}

/// Reads one register of a simulation result as an integer.
pub fn read(out: &Values, register: &str) -> u128 {
    out[register].to_u128().unwrap_or_else(|| panic!("register {register} wider than 128 bits"))
}

/// GF(2^m) product computed by polynomial arithmetic modulo the canonical polynomial.
pub fn field_product(x: u128, y: u128, m: u32) -> u128 {
    let modulus = gf2_poly::canonical_polynomial(m).unwrap_or_else(|| panic!("no canonical polynomial for m={m}"));
    gf2_poly::mul_mod(x, y, modulus)
}

/// Loads a project from TOML text and costs every operation.
pub fn cost_project(toml: &str) -> Result<ProjectResult, ConfigError> {
    let config = load_config_from_str(toml)?;
    let sink = DiagnosticSink::new();
    let ops = resolve_all(&config)?
        .into_iter()
        .map(|op| {
            let options = CallGraphOptions {
                max_depth: op.costing.max_depth,
                parallel: op.costing.parallel,
            };
            let counts = gate_counts_with(&op.bloq, &DecompositionRules, options, &sink)
                .unwrap_or_else(|e| panic!("costing {} failed: {e}", op.name));
            (op.name, op.bloq, counts)
        })
        .collect();
    let diagnostics = sink.take_all();
    let warning_count = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    Ok(ProjectResult {
        ops,
        diagnostics,
        warning_count,
    })
}
