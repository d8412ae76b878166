//! The GF(2^m) reduction map and its CNOT synthesis.
//!
//! Columns `0..m-1` of `M` are `x^{m+i} mod P(x)`; the last column is the
//! highest unit vector that makes `M` invertible. `M` is synthesized by
//! Gauss-Jordan elimination: each row addition becomes a CNOT and each row
//! swap a free rewiring.

use crate::circuit::Program;
use crate::error::{RuleError, RuleResult};
use revcost_common::gf2_poly;
use revcost_ir::ConfigurationError;

/// A square GF(2) matrix stored as row bit masks; bit `c` of row `r` is `M[r][c]`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct BitMatrix {
    rows: Vec<u128>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RowOp {
    Swap(usize, usize),
    /// `row[target] ^= row[source]`.
    AddRow { target: usize, source: usize },
}

fn rank(vectors: &[u128]) -> usize {
    let mut basis: Vec<u128> = Vec::new();
    for &v in vectors {
        let reduced = basis.iter().fold(v, |acc, &b| acc.min(acc ^ b));
        if reduced != 0 {
            basis.push(reduced);
            basis.sort_unstable_by(|a, b| b.cmp(a));
        }
    }
    basis.len()
}

impl BitMatrix {
    fn from_columns(columns: &[u128], m: usize) -> Self {
        let rows = (0..m)
            .map(|r| {
                columns
                    .iter()
                    .enumerate()
                    .fold(0u128, |row, (c, col)| row | (((col >> r) & 1) << c))
            })
            .collect();
        Self { rows }
    }

    /// The reduction matrix `[Q | v]` of GF(2^m).
    pub(crate) fn reduction(m: u32) -> RuleResult<Self> {
        let unsupported = || RuleError::Configuration(ConfigurationError::UnsupportedFieldDegree { m: m.into() });
        let poly = gf2_poly::canonical_polynomial(m).ok_or_else(unsupported)?;
        let mut columns: Vec<u128> = (0..m.saturating_sub(1))
            .map(|i| gf2_poly::poly_mod(1u128 << (m + i), poly))
            .collect();
        let completion = (0..m)
            .rev()
            .map(|j| 1u128 << j)
            .find(|&e| {
                let mut candidate = columns.clone();
                candidate.push(e);
                rank(&candidate) == m as usize
            })
            .ok_or_else(unsupported)?;
        columns.push(completion);
        Ok(Self::from_columns(&columns, m as usize))
    }

    /// Dimension.
    pub(crate) fn size(&self) -> usize {
        self.rows.len()
    }

    /// Matrix-vector product over GF(2).
    pub(crate) fn apply(&self, v: u128) -> u128 {
        self.rows
            .iter()
            .enumerate()
            .fold(0, |out, (r, row)| out | (u128::from((row & v).count_ones() & 1 == 1) << r))
    }

    fn eliminate(&self) -> RuleResult<Vec<RowOp>> {
        let n = self.size();
        let mut a = self.rows.clone();
        let mut ops = Vec::new();
        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| (a[r] >> col) & 1 == 1)
                .ok_or_else(|| {
                    RuleError::Configuration(ConfigurationError::UnsupportedFieldDegree {
                        m: (n as u32).into(),
                    })
                })?;
            if pivot != col {
                a.swap(col, pivot);
                ops.push(RowOp::Swap(col, pivot));
            }
            for r in 0..n {
                if r != col && (a[r] >> col) & 1 == 1 {
                    a[r] ^= a[col];
                    ops.push(RowOp::AddRow { target: r, source: col });
                }
            }
        }
        Ok(ops)
    }

    /// A CNOT program applying this matrix in place to slots `base..base + size`.
    ///
    /// Elimination finds `E_k ... E_1 M = I` with self-inverse `E_i`, so
    /// `M = E_1 ... E_k` and the program replays the operations backwards.
    pub(crate) fn program(&self, base: usize) -> RuleResult<Program> {
        let mut p = Program::default();
        for op in self.eliminate()?.into_iter().rev() {
            match op {
                RowOp::Swap(a, b) => p.swap(base + a, base + b),
                RowOp::AddRow { target, source } => p.cnot(base + source, base + target),
            }
        }
        Ok(p)
    }
}
