//! Registers and signatures: the external interface of an operation node.

use crate::error::ConfigurationError;
use revcost_common::SymInt;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Which side of an operation a register lives on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum Direction {
    /// Consumed by the operation and not returned.
    In,
    /// Produced by the operation from nothing.
    Out,
    /// Consumed and returned with the same width.
    InOut,
}

impl Direction {
    /// Returns `true` for `In` and `InOut`.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    /// Returns `true` for `Out` and `InOut`.
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }

    /// Swaps `In` and `Out`.
    pub fn adjoint(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
            Direction::InOut => Direction::InOut,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
            Direction::InOut => write!(f, "inout"),
        }
    }
}

/// How a register is carried by wires.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum Shape {
    /// One wire of the full bitwidth.
    Whole,
    /// One single-bit wire per bit, least significant first.
    PerBit,
}

/// A named, directional bit-vector parameter of an operation.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Register {
    name: String,
    bitwidth: SymInt,
    direction: Direction,
    shape: Shape,
}

impl Register {
    /// Creates a register carried by a single wire.
    pub fn new(name: impl Into<String>, bitwidth: impl Into<SymInt>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            bitwidth: bitwidth.into(),
            direction,
            shape: Shape::Whole,
        }
    }

    /// Creates a register carried by one wire per bit.
    pub fn per_bit(name: impl Into<String>, bitwidth: impl Into<SymInt>, direction: Direction) -> Self {
        Self {
            shape: Shape::PerBit,
            ..Self::new(name, bitwidth, direction)
        }
    }

    /// Shorthand for an `InOut` register.
    pub fn thru(name: impl Into<String>, bitwidth: impl Into<SymInt>) -> Self {
        Self::new(name, bitwidth, Direction::InOut)
    }

    /// The register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The register width.
    pub fn bitwidth(&self) -> &SymInt {
        &self.bitwidth
    }

    /// The register direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The register wiring shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the same register with `In` and `Out` swapped.
    pub fn adjoint(&self) -> Self {
        Self {
            direction: self.direction.adjoint(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}[{}]", self.name, self.direction, self.bitwidth)?;
        if self.shape == Shape::PerBit {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// An ordered list of registers with unique names.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct Signature {
    registers: Vec<Register>,
}

impl Signature {
    /// Creates a signature, rejecting duplicate names and non-positive widths.
    pub fn new(registers: Vec<Register>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for reg in &registers {
            if !seen.insert(reg.name.as_str()) {
                return Err(ConfigurationError::DuplicateRegister {
                    name: reg.name.clone(),
                });
            }
            if reg.bitwidth.is_known_non_positive() {
                return Err(ConfigurationError::NonPositiveBitwidth {
                    op: "Signature",
                    bitwidth: reg.bitwidth.clone(),
                });
            }
        }
        Ok(Self { registers })
    }

    /// Builds a signature from registers already known to be valid.
    pub(crate) fn from_valid(registers: Vec<Register>) -> Self {
        Self { registers }
    }

    /// Looks up a register by name.
    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Iterates over registers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter()
    }

    /// Registers consumed by the operation (`In` and `InOut`).
    pub fn lefts(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter().filter(|r| r.direction.is_input())
    }

    /// Registers produced by the operation (`Out` and `InOut`).
    pub fn rights(&self) -> impl Iterator<Item = &Register> {
        self.registers.iter().filter(|r| r.direction.is_output())
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Returns `true` if there are no registers.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Total width of the input side.
    pub fn n_input_bits(&self) -> SymInt {
        self.lefts().map(|r| &r.bitwidth).sum()
    }

    /// Total width of the output side.
    pub fn n_output_bits(&self) -> SymInt {
        self.rights().map(|r| &r.bitwidth).sum()
    }

    /// The signature of the inverse operation.
    pub fn adjoint(&self) -> Self {
        Self {
            registers: self.registers.iter().map(Register::adjoint).collect(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, reg) in self.registers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{reg}")?;
        }
        f.write_str(")")
    }
}
