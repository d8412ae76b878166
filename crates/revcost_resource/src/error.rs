//! Call-graph error types.

use revcost_decompose::DecomposeError;

/// Errors that can occur while building a call graph or counting gates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallGraphError {
    /// The expansion reached a node that (transitively) calls itself.
    #[error("decomposition of {bloq} is cyclic")]
    CyclicDecomposition {
        /// A node on the cycle.
        bloq: String,
    },

    /// A node's callees could not be determined.
    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    /// A leaf of a full expansion is not a gate the cost model knows.
    #[error("{bloq} is not an elementary gate and cannot be costed")]
    Unclassified {
        /// Display form of the leaf.
        bloq: String,
    },
}
