//! Resource counting for revcost operation nodes.
//!
//! [`build_call_graph`] expands a node breadth first through a
//! [`CalleeSource`](revcost_decompose::CalleeSource), memoizing by structural
//! equality, and returns the call graph together with the count map of its
//! leaves. [`gate_counts`] builds on it to report elementary gate totals and
//! the T-count.
//!
//! # Usage
//!
//! ```ignore
//! use revcost_decompose::DecompositionRules;
//! use revcost_resource::{build_call_graph, generalizer, CallGraphOptions};
//! let sink = revcost_diagnostics::DiagnosticSink::new();
//! let (graph, sigma) = build_call_graph(
//!     &bloq,
//!     &DecompositionRules,
//!     &generalizer::ignore_bookkeeping,
//!     CallGraphOptions::full(),
//!     &sink,
//! )?;
//! ```

#![warn(missing_docs)]

pub mod call_graph;
pub mod error;
pub mod gate_counts;
pub mod generalizer;

pub use call_graph::{build_call_graph, CallGraph, CallGraphOptions, CountMap};
pub use error::CallGraphError;
pub use gate_counts::{gate_counts, gate_counts_with, GateCounts};
pub use generalizer::{Composed, Generalizer, KeepAll};
