//! Shared foundational types used across the revcost workspace.
//!
//! This crate provides symbolic integers for bitwidths and gate counts, packed
//! two-state bit vectors for classical simulation, binary polynomial arithmetic
//! for GF(2^m) fields, and stable content hashing.

#![warn(missing_docs)]

pub mod bits;
pub mod gf2_poly;
pub mod hash;
pub mod sym;

pub use bits::Bits;
pub use hash::ContentHash;
pub use sym::{Bindings, Rational, SymError, SymInt};
