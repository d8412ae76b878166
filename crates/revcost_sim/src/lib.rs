//! Classical bit-level simulation of revcost nodes.
//!
//! Every gate the decomposition rules emit permutes computational basis
//! states, so a decomposition can be checked by pushing bit values through
//! its wiring graph. [`Simulator`] does that recursively down to elementary
//! gates; [`reference::classical_action`] gives the arithmetic meaning of
//! each composite to compare against.

#![warn(missing_docs)]

pub mod error;
mod evaluator;
mod gates;
pub mod reference;

pub use error::SimError;
pub use evaluator::{simulate, simulate_graph, values, Simulator, Values};
pub use reference::classical_action;
