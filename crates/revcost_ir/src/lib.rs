//! The operation-node IR for revcost.
//!
//! This crate defines [`Register`] and [`Signature`], the closed [`Bloq`]
//! union of elementary gates, bookkeeping operations and arithmetic
//! composites, and the [`WiringGraph`] that a composite decomposes into.
//! Wiring graphs are arena-backed DAGs built through a linear
//! [`WiringBuilder`] that checks register widths as wires are connected.

#![warn(missing_docs)]

pub mod arena;
pub mod bloq;
pub mod error;
pub mod ids;
pub mod register;
pub mod wiring;

pub use arena::{Arena, ArenaId};
pub use bloq::{Add, AddK, Bloq, GF2Multiplication, GF2PartialProduct, GF2Reduction, OutOfPlaceAdder, ProductPart};
pub use error::{ConfigurationError, SignatureMismatchError};
pub use ids::{NodeId, WireId};
pub use register::{Direction, Register, Shape, Signature};
pub use wiring::{Connection, Instance, Port, Wire, WiringBuilder, WiringGraph};
