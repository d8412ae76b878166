//! Decomposition rules for revcost operation nodes.
//!
//! [`decompose`] lowers one composite node into a [`WiringGraph`] of child
//! nodes, one level at a time; elementary gates and bookkeeping nodes are
//! [`Decomposition::Elementary`]. [`callees`] reports the direct children with
//! multiplicities and also works for symbolic parameters, where no wiring
//! graph can be materialized, by falling back to closed-form counts.
//!
//! Every rule describes its gates as a slot program (see `circuit`) so that
//! adjoint forms are obtained by reversing the program.
//!
//! # Usage
//!
//! ```ignore
//! use revcost_decompose::{decompose, Decomposition};
//! let Decomposition::Composite(graph) = decompose(&bloq)? else { return Ok(()) };
//! println!("{} children", graph.node_count());
//! ```

#![warn(missing_docs)]

mod add;
mod add_k;
mod callees;
mod circuit;
mod error;
mod gf2_mul;
mod linear;
mod out_of_place;

pub use callees::Callees;
pub use error::DecomposeError;

use error::{RuleError, RuleResult};
use revcost_common::SymInt;
use revcost_ir::{Bloq, SignatureMismatchError, WiringGraph};

/// The result of decomposing one node.
#[derive(Clone, Debug)]
pub enum Decomposition {
    /// A wiring graph of child nodes with the parent's signature.
    Composite(WiringGraph),
    /// The node has no decomposition.
    Elementary,
}

impl Decomposition {
    /// The wiring graph, if composite.
    pub fn graph(&self) -> Option<&WiringGraph> {
        match self {
            Decomposition::Composite(graph) => Some(graph),
            Decomposition::Elementary => None,
        }
    }
}

pub(crate) fn concrete(width: &SymInt) -> RuleResult<u32> {
    width.as_u32().ok_or(RuleError::Symbolic)
}

/// Decomposes `bloq` one level.
///
/// The returned graph is checked against the node's signature: same register
/// names, directions and widths, every wire consumed exactly once.
pub fn decompose(bloq: &Bloq) -> Result<Decomposition, DecomposeError> {
    bloq.validate()?;
    if bloq.is_elementary() {
        return Ok(Decomposition::Elementary);
    }
    if !bloq.is_concrete() {
        return Err(DecomposeError::Symbolic {
            bloq: bloq.to_string(),
        });
    }
    let graph = match bloq {
        Bloq::Add(a) => add::decompose(a),
        Bloq::OutOfPlaceAdder(oop) => out_of_place::decompose(oop),
        Bloq::AddK(k) => add_k::decompose(k),
        Bloq::GF2Multiplication(mul) => gf2_mul::decompose_multiplication(mul),
        Bloq::GF2PartialProduct(pp) => gf2_mul::decompose_partial_product(pp),
        Bloq::GF2Reduction(red) => gf2_mul::decompose_reduction(red),
        _ => return Ok(Decomposition::Elementary),
    }
    .map_err(|e| e.at(bloq))?;
    check_signature(bloq, &graph).map_err(|e| RuleError::from(e).at(bloq))?;
    Ok(Decomposition::Composite(graph))
}

fn check_signature(bloq: &Bloq, graph: &WiringGraph) -> Result<(), SignatureMismatchError> {
    let expected = bloq.signature();
    if graph.signature() != &expected {
        return Err(SignatureMismatchError::SignatureDiffers {
            op: bloq.to_string(),
            expected: expected.to_string(),
            found: graph.signature().to_string(),
        });
    }
    graph.validate()
}

/// The direct children of `bloq` with multiplicities.
///
/// Concrete composites are decomposed and their child instances counted;
/// symbolic composites use closed forms. Elementary nodes have no callees.
pub fn callees(bloq: &Bloq) -> Result<Callees, DecomposeError> {
    bloq.validate()?;
    if bloq.is_elementary() {
        return Ok(Callees::default());
    }
    if bloq.is_concrete() {
        return Ok(match decompose(bloq)? {
            Decomposition::Composite(graph) => Callees::from_graph(&graph),
            Decomposition::Elementary => Callees::default(),
        });
    }
    callees::closed_form(bloq)
}

/// Where the call-graph aggregator gets a node's children from.
///
/// Implementations must be deterministic; the aggregator may call them from
/// several threads at once.
pub trait CalleeSource: Sync {
    /// The direct children of `bloq`.
    fn callees(&self, bloq: &Bloq) -> Result<Callees, DecomposeError>;
}

/// The built-in decomposition rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecompositionRules;

impl CalleeSource for DecompositionRules {
    fn callees(&self, bloq: &Bloq) -> Result<Callees, DecomposeError> {
        callees(bloq)
    }
}
