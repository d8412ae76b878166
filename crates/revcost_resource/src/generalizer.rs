//! Node generalizers applied to callees before they are counted.
//!
//! A generalizer either drops a node (returns `None`), so it never appears in
//! the call graph, or maps it to a coarser node so that differently
//! parametrized callees land in one bucket. The built-in generalizers are
//! plain functions; closures work too.

use revcost_common::SymInt;
use revcost_ir::{AddK, Bloq};

/// Maps a callee to the node it is counted as, or drops it.
pub trait Generalizer: Sync {
    /// Returns the node to count in place of `bloq`, or `None` to ignore it.
    fn generalize(&self, bloq: Bloq) -> Option<Bloq>;
}

impl<F> Generalizer for F
where
    F: Fn(Bloq) -> Option<Bloq> + Sync,
{
    fn generalize(&self, bloq: Bloq) -> Option<Bloq> {
        self(bloq)
    }
}

/// The generalizer that keeps every node as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAll;

impl Generalizer for KeepAll {
    fn generalize(&self, bloq: Bloq) -> Option<Bloq> {
        Some(bloq)
    }
}

/// Drops register splits and joins.
pub fn ignore_split_join(bloq: Bloq) -> Option<Bloq> {
    match bloq {
        Bloq::Split { .. } | Bloq::Join { .. } => None,
        other => Some(other),
    }
}

/// Drops ancilla allocation and release.
pub fn ignore_alloc_free(bloq: Bloq) -> Option<Bloq> {
    match bloq {
        Bloq::Allocate { .. } | Bloq::Free { .. } => None,
        other => Some(other),
    }
}

/// Drops every bookkeeping node.
pub fn ignore_bookkeeping(bloq: Bloq) -> Option<Bloq> {
    (!bloq.is_bookkeeping()).then_some(bloq)
}

/// Replaces the constant of every [`AddK`] with the symbol `k`.
pub fn generalize_add_k_constant(bloq: Bloq) -> Option<Bloq> {
    Some(match bloq {
        Bloq::AddK(add_k) => Bloq::AddK(add_k.with_constant_unchecked(SymInt::symbol("k"))),
        other => other,
    })
}

/// Resets control values to all ones.
pub fn generalize_cvs(bloq: Bloq) -> Option<Bloq> {
    Some(match bloq {
        Bloq::MultiControlX { cvs } => Bloq::MultiControlX { cvs: vec![1; cvs.len()] },
        Bloq::AddK(add_k) => Bloq::AddK(all_ones(&add_k).unwrap_or(add_k)),
        other => other,
    })
}

fn all_ones(add_k: &AddK) -> Option<AddK> {
    add_k.with_control_values(vec![1; add_k.cvs().len()]).ok()
}

/// A chain of generalizers applied left to right; a drop short-circuits.
#[derive(Default)]
pub struct Composed {
    parts: Vec<Box<dyn Generalizer>>,
}

impl Composed {
    /// Creates an empty chain, equivalent to [`KeepAll`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a generalizer to the chain.
    pub fn then(mut self, next: impl Generalizer + 'static) -> Self {
        self.parts.push(Box::new(next));
        self
    }

    /// Number of generalizers in the chain.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the chain keeps every node.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Generalizer for Composed {
    fn generalize(&self, bloq: Bloq) -> Option<Bloq> {
        self.parts.iter().try_fold(bloq, |b, g| g.generalize(b))
    }
}

impl std::fmt::Debug for Composed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composed").field("len", &self.parts.len()).finish()
    }
}

/// Looks up a built-in generalizer by its kebab-case name, as used in
/// `revcost.toml` and on the command line.
pub fn named(name: &str) -> Option<fn(Bloq) -> Option<Bloq>> {
    let g: fn(Bloq) -> Option<Bloq> = match name {
        "ignore-split-join" => ignore_split_join,
        "ignore-alloc-free" => ignore_alloc_free,
        "ignore-bookkeeping" => ignore_bookkeeping,
        "generalize-add-k-constant" => generalize_add_k_constant,
        "generalize-cvs" => generalize_cvs,
        _ => return None,
    };
    Some(g)
}

/// Names accepted by [`named`].
pub const NAMES: [&str; 5] = [
    "ignore-split-join",
    "ignore-alloc-free",
    "ignore-bookkeeping",
    "generalize-add-k-constant",
    "generalize-cvs",
];
