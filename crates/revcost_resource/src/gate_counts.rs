//! Gate counts of a fully expanded node.

use crate::call_graph::{build_call_graph, CallGraphOptions, CountMap};
use crate::error::CallGraphError;
use crate::generalizer::ignore_bookkeeping;
use num_traits::Zero;
use revcost_common::SymInt;
use revcost_decompose::{CalleeSource, DecomposeError};
use revcost_diagnostics::DiagnosticSink;
use revcost_ir::Bloq;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// Counts of the elementary gates a node expands into.
///
/// An uncomputing `And` is measurement based: it counts in `and_uncompute`,
/// adds one measurement and one CNOT, and contributes no T gates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GateCounts {
    /// Toffoli gates.
    pub toffoli: SymInt,
    /// Computing `And` gates.
    pub and_bloq: SymInt,
    /// Uncomputing `And` gates.
    pub and_uncompute: SymInt,
    /// CNOT gates.
    pub cnot: SymInt,
    /// X gates.
    pub x: SymInt,
    /// Multi-controlled X gates.
    pub multi_control_pauli: SymInt,
    /// Total number of controls over all multi-controlled X gates.
    pub multi_control_pauli_controls: SymInt,
    /// Measurements.
    pub measurement: SymInt,
}

impl GateCounts {
    fn fields(&self) -> [(&'static str, &SymInt); 8] {
        [
            ("toffoli", &self.toffoli),
            ("and_bloq", &self.and_bloq),
            ("and_uncompute", &self.and_uncompute),
            ("cnot", &self.cnot),
            ("x", &self.x),
            ("multi_control_pauli", &self.multi_control_pauli),
            ("multi_control_pauli_controls", &self.multi_control_pauli_controls),
            ("measurement", &self.measurement),
        ]
    }

    fn fields_mut(&mut self) -> [&mut SymInt; 8] {
        [
            &mut self.toffoli,
            &mut self.and_bloq,
            &mut self.and_uncompute,
            &mut self.cnot,
            &mut self.x,
            &mut self.multi_control_pauli,
            &mut self.multi_control_pauli_controls,
            &mut self.measurement,
        ]
    }

    /// Counts for `n` copies of an elementary gate.
    pub fn of_leaf(bloq: &Bloq, n: &SymInt) -> Result<Self, CallGraphError> {
        let mut counts = Self::default();
        match bloq {
            Bloq::Toffoli => counts.toffoli = n.clone(),
            Bloq::And { uncompute: false } => counts.and_bloq = n.clone(),
            Bloq::And { uncompute: true } => {
                counts.and_uncompute = n.clone();
                counts.measurement = n.clone();
                counts.cnot = n.clone();
            }
            Bloq::Cnot => counts.cnot = n.clone(),
            Bloq::XGate => counts.x = n.clone(),
            Bloq::MultiControlX { cvs } => {
                bloq.validate().map_err(DecomposeError::from)?;
                counts.multi_control_pauli = n.clone();
                counts.multi_control_pauli_controls = n * i64::try_from(cvs.len()).unwrap_or(i64::MAX);
            }
            _ if bloq.is_bookkeeping() => {}
            _ => {
                return Err(CallGraphError::Unclassified {
                    bloq: bloq.to_string(),
                })
            }
        }
        Ok(counts)
    }

    /// Sums the gate counts of every leaf in a count map.
    pub fn from_sigma(sigma: &CountMap) -> Result<Self, CallGraphError> {
        sigma
            .iter()
            .map(|(bloq, n)| Self::of_leaf(bloq, n))
            .try_fold(Self::default(), |acc, c| Ok(acc + c?))
    }

    /// T gates: four per Toffoli and four per computing `And`.
    pub fn total_t_count(&self) -> SymInt {
        (&self.toffoli + &self.and_bloq) * 4
    }

    /// Non-zero counts by field name.
    pub fn as_map(&self) -> BTreeMap<&'static str, SymInt> {
        self.fields()
            .into_iter()
            .filter(|(_, n)| !n.is_zero())
            .map(|(name, n)| (name, n.clone()))
            .collect()
    }

    /// Returns `true` if every count is zero.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, n)| n.is_zero())
    }
}

impl AddAssign<&GateCounts> for GateCounts {
    fn add_assign(&mut self, rhs: &GateCounts) {
        for (lhs, (_, r)) in self.fields_mut().into_iter().zip(rhs.fields()) {
            *lhs += r;
        }
    }
}

impl Add for GateCounts {
    type Output = GateCounts;

    fn add(mut self, rhs: GateCounts) -> GateCounts {
        self += &rhs;
        self
    }
}

impl Mul<&SymInt> for &GateCounts {
    type Output = GateCounts;

    fn mul(self, rhs: &SymInt) -> GateCounts {
        let mut out = self.clone();
        for n in out.fields_mut() {
            *n = &*n * rhs;
        }
        out
    }
}

impl fmt::Display for GateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, n) in self.fields() {
            if n.is_zero() {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {n}")?;
            first = false;
        }
        if first {
            write!(f, "(empty)")?;
        }
        Ok(())
    }
}

/// Expands `root` down to elementary gates, ignoring bookkeeping, and
/// classifies every leaf.
pub fn gate_counts(root: &Bloq, source: &dyn CalleeSource, sink: &DiagnosticSink) -> Result<GateCounts, CallGraphError> {
    gate_counts_with(root, source, CallGraphOptions::full(), sink)
}

/// Like [`gate_counts`], with explicit expansion options.
///
/// Gate totals do not depend on `options.max_depth`: composite leaves left at
/// the depth limit are expanded the rest of the way on their own.
pub fn gate_counts_with(
    root: &Bloq,
    source: &dyn CalleeSource,
    options: CallGraphOptions,
    sink: &DiagnosticSink,
) -> Result<GateCounts, CallGraphError> {
    let (_, sigma) = build_call_graph(root, source, &ignore_bookkeeping, options, sink)?;
    if options.max_depth.is_none() {
        return GateCounts::from_sigma(&sigma);
    }
    let rest = CallGraphOptions {
        max_depth: None,
        ..options
    };
    let mut total = GateCounts::default();
    for (leaf, n) in &sigma {
        if leaf.is_elementary() || leaf.is_bookkeeping() {
            total += &GateCounts::of_leaf(leaf, n)?;
            continue;
        }
        tracing::debug!(leaf = %leaf, "expanding past depth limit");
        let (_, below) = build_call_graph(leaf, source, &ignore_bookkeeping, rest, sink)?;
        total += &(&GateCounts::from_sigma(&below)? * n);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcost_decompose::DecompositionRules;
    use revcost_ir::{Add as AddBloq, AddK, GF2Multiplication, OutOfPlaceAdder};

    fn counts(root: &Bloq) -> GateCounts {
        gate_counts(root, &DecompositionRules, &DiagnosticSink::new()).unwrap()
    }

    #[test]
    fn display_skips_zeros() {
        let c = GateCounts {
            toffoli: SymInt::lit(16),
            cnot: SymInt::lit(12),
            ..Default::default()
        };
        assert_eq!(c.to_string(), "toffoli: 16, cnot: 12");
        assert_eq!(GateCounts::default().to_string(), "(empty)");
        assert_eq!(c.as_map().keys().copied().collect::<Vec<_>>(), vec!["cnot", "toffoli"]);
    }

    #[test]
    fn arithmetic() {
        let a = GateCounts::of_leaf(&Bloq::AND, &SymInt::lit(2)).unwrap();
        let b = GateCounts::of_leaf(&Bloq::AND_ADJOINT, &SymInt::lit(2)).unwrap();
        let sum = a + b;
        assert_eq!(sum.measurement, SymInt::lit(2));
        let scaled = &sum * &SymInt::symbol("r");
        assert_eq!(scaled.and_bloq.to_string(), "2*r");
        assert_eq!(scaled.total_t_count().to_string(), "8*r");
    }

    #[test]
    fn adder_t_count() {
        for n in 1..=8u32 {
            let c = counts(&Bloq::Add(AddBloq::symmetric(n).unwrap()));
            assert_eq!(c.total_t_count(), SymInt::from(4 * (n - 1)), "n = {n}");
        }
        let c = counts(&Bloq::Add(AddBloq::symmetric(SymInt::symbol("n")).unwrap()));
        assert_eq!(c.total_t_count().to_string(), "4*n - 4");
    }

    #[test]
    fn adjoint_adder_has_no_t() {
        let fwd = OutOfPlaceAdder::new(5u32).unwrap();
        assert_eq!(counts(&Bloq::OutOfPlaceAdder(fwd.clone())).total_t_count(), SymInt::lit(20));
        let adj = counts(&Bloq::OutOfPlaceAdder(fwd.adjoint()));
        assert!(adj.total_t_count().is_zero());
        assert_eq!(adj.and_uncompute, SymInt::lit(5));
    }

    #[test]
    fn multiplication_toffolis() {
        for plus_equal in [false, true] {
            let c = counts(&Bloq::GF2Multiplication(GF2Multiplication::new(4u32, plus_equal).unwrap()));
            assert_eq!(c.toffoli, SymInt::lit(16));
            let m = SymInt::symbol("m");
            let c = counts(&Bloq::GF2Multiplication(GF2Multiplication::new(m, plus_equal).unwrap()));
            assert_eq!(c.toffoli.to_string(), "m**2");
        }
    }

    #[test]
    fn controlled_load_uses_multi_control() {
        let root = Bloq::AddK(AddK::controlled(4u32, 0b0101i64, false, vec![1, 1]).unwrap());
        let c = counts(&root);
        assert_eq!(c.multi_control_pauli, SymInt::lit(4));
        assert_eq!(c.multi_control_pauli_controls, SymInt::lit(8));
        assert_eq!(c.and_bloq, SymInt::lit(3));
    }

    #[test]
    fn composite_leaf_is_unclassified() {
        let add = Bloq::Add(AddBloq::symmetric(3u32).unwrap());
        let err = GateCounts::of_leaf(&add, &SymInt::lit(1)).unwrap_err();
        assert!(matches!(err, CallGraphError::Unclassified { .. }));
    }

    #[test]
    fn depth_limit_does_not_change_totals() {
        let roots = [
            Bloq::Add(AddBloq::symmetric(3u32).unwrap()),
            Bloq::GF2Multiplication(GF2Multiplication::new(4u32, false).unwrap()),
            Bloq::GF2Multiplication(GF2Multiplication::new(SymInt::symbol("m"), true).unwrap()),
            Bloq::AddK(AddK::new(6u32, 37i64, false).unwrap()),
        ];
        for root in roots {
            let full = counts(&root);
            for depth in 0..=3 {
                let sink = DiagnosticSink::new();
                let limited = gate_counts_with(&root, &DecompositionRules, CallGraphOptions::depth(depth), &sink).unwrap();
                assert_eq!(limited, full, "{root} at depth {depth}");
            }
        }
    }
}
