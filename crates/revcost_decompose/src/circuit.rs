//! Gate programs over numbered bit slots.
//!
//! Rules describe their gate sequences as a [`Program`] over slot indices and
//! a [`SlotEmitter`] replays the program into a [`WiringBuilder`], tracking
//! which wire currently occupies each slot. An empty slot is a bit that does
//! not exist yet (an `And` target) or no longer exists (after `And†`).
//! Describing circuits this way gives adjoints for free: [`Program::inverse`]
//! reverses the gate list and swaps `And` with `And†`.

use revcost_ir::{SignatureMismatchError, WireId, WiringBuilder};
use std::ops::Range;

/// One gate over slot indices.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Gate {
    X(usize),
    Cnot { ctrl: usize, target: usize },
    Toffoli { ctrl0: usize, ctrl1: usize, target: usize },
    And { ctrl0: usize, ctrl1: usize, target: usize },
    AndAdjoint { ctrl0: usize, ctrl1: usize, target: usize },
    /// Exchanges two slots; a rewiring, not a gate.
    Swap(usize, usize),
}

impl Gate {
    fn inverse(self) -> Gate {
        match self {
            Gate::And { ctrl0, ctrl1, target } => Gate::AndAdjoint { ctrl0, ctrl1, target },
            Gate::AndAdjoint { ctrl0, ctrl1, target } => Gate::And { ctrl0, ctrl1, target },
            other => other,
        }
    }
}

/// A straight-line gate sequence.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(crate) struct Program {
    gates: Vec<Gate>,
}

impl Program {
    pub(crate) fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub(crate) fn push(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    pub(crate) fn cnot(&mut self, ctrl: usize, target: usize) {
        self.push(Gate::Cnot { ctrl, target });
    }

    pub(crate) fn toffoli(&mut self, ctrl0: usize, ctrl1: usize, target: usize) {
        self.push(Gate::Toffoli { ctrl0, ctrl1, target });
    }

    pub(crate) fn and(&mut self, ctrl0: usize, ctrl1: usize, target: usize) {
        self.push(Gate::And { ctrl0, ctrl1, target });
    }

    pub(crate) fn and_adjoint(&mut self, ctrl0: usize, ctrl1: usize, target: usize) {
        self.push(Gate::AndAdjoint { ctrl0, ctrl1, target });
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.push(Gate::Swap(a, b));
    }

    /// The program that undoes this one.
    pub(crate) fn inverse(&self) -> Program {
        Program {
            gates: self.gates.iter().rev().map(|g| g.inverse()).collect(),
        }
    }
}

/// Replays programs into a builder.
pub(crate) struct SlotEmitter<'a> {
    bb: &'a mut WiringBuilder,
    slots: Vec<Option<WireId>>,
}

impl<'a> SlotEmitter<'a> {
    pub(crate) fn new(bb: &'a mut WiringBuilder) -> Self {
        Self { bb, slots: Vec::new() }
    }

    /// Splits `wire` and places its bits in fresh slots, least significant first.
    pub(crate) fn load_split(&mut self, wire: WireId) -> Result<Range<usize>, SignatureMismatchError> {
        let bits = self.bb.split(wire)?;
        Ok(self.load_bits(bits))
    }

    /// Places single-bit wires in fresh slots.
    pub(crate) fn load_bits(&mut self, bits: Vec<WireId>) -> Range<usize> {
        let start = self.slots.len();
        self.slots.extend(bits.into_iter().map(Some));
        start..self.slots.len()
    }

    /// Reserves `n` empty slots for bits created later.
    pub(crate) fn reserve(&mut self, n: usize) -> Range<usize> {
        let start = self.slots.len();
        self.slots.resize(start + n, None);
        start..self.slots.len()
    }

    fn take(&mut self, slot: usize) -> Result<WireId, SignatureMismatchError> {
        self.slots
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or_else(|| SignatureMismatchError::WireReused {
                wire: format!("slot {slot}"),
            })
    }

    fn put(&mut self, slot: usize, wire: WireId) -> Result<(), SignatureMismatchError> {
        match self.slots.get_mut(slot) {
            Some(entry @ None) => {
                *entry = Some(wire);
                Ok(())
            }
            _ => Err(SignatureMismatchError::DanglingWire {
                wire: format!("slot {slot}"),
            }),
        }
    }

    /// Emits every gate of `program`.
    pub(crate) fn run(&mut self, program: &Program) -> Result<(), SignatureMismatchError> {
        for gate in program.gates() {
            match *gate {
                Gate::X(q) => {
                    let w = self.take(q)?;
                    let w = self.bb.x(w)?;
                    self.put(q, w)?;
                }
                Gate::Cnot { ctrl, target } => {
                    let (c, t) = (self.take(ctrl)?, self.take(target)?);
                    let (c, t) = self.bb.cnot(c, t)?;
                    self.put(ctrl, c)?;
                    self.put(target, t)?;
                }
                Gate::Toffoli { ctrl0, ctrl1, target } => {
                    let (c0, c1, t) = (self.take(ctrl0)?, self.take(ctrl1)?, self.take(target)?);
                    let (c0, c1, t) = self.bb.toffoli(c0, c1, t)?;
                    self.put(ctrl0, c0)?;
                    self.put(ctrl1, c1)?;
                    self.put(target, t)?;
                }
                Gate::And { ctrl0, ctrl1, target } => {
                    let (c0, c1) = (self.take(ctrl0)?, self.take(ctrl1)?);
                    let (c0, c1, t) = self.bb.and(c0, c1)?;
                    self.put(ctrl0, c0)?;
                    self.put(ctrl1, c1)?;
                    self.put(target, t)?;
                }
                Gate::AndAdjoint { ctrl0, ctrl1, target } => {
                    let (c0, c1, t) = (self.take(ctrl0)?, self.take(ctrl1)?, self.take(target)?);
                    let (c0, c1) = self.bb.and_adjoint(c0, c1, t)?;
                    self.put(ctrl0, c0)?;
                    self.put(ctrl1, c1)?;
                }
                Gate::Swap(a, b) => self.slots.swap(a, b),
            }
        }
        Ok(())
    }

    /// Removes the wire in one slot.
    pub(crate) fn take_one(&mut self, slot: usize) -> Result<WireId, SignatureMismatchError> {
        self.take(slot)
    }

    /// Removes the wires of a slot range and joins them into one wire.
    pub(crate) fn take_join(&mut self, range: Range<usize>) -> Result<WireId, SignatureMismatchError> {
        let bits = range.map(|slot| self.take(slot)).collect::<Result<Vec<_>, _>>()?;
        self.bb.join(&bits)
    }

    /// Checks that every slot has been taken.
    pub(crate) fn finish(self) -> Result<(), SignatureMismatchError> {
        match self.slots.iter().position(Option::is_some) {
            Some(slot) => Err(SignatureMismatchError::DanglingWire {
                wire: format!("slot {slot}"),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcost_ir::{Bloq, Register, Signature};

    #[test]
    fn inverse_reverses_and_swaps_and() {
        let mut p = Program::default();
        p.cnot(0, 1);
        p.and(0, 1, 2);
        p.swap(0, 1);
        let inv = p.inverse();
        assert_eq!(
            inv.gates(),
            &[
                Gate::Swap(0, 1),
                Gate::AndAdjoint { ctrl0: 0, ctrl1: 1, target: 2 },
                Gate::Cnot { ctrl: 0, target: 1 },
            ]
        );
        assert_eq!(inv.inverse(), p);
    }

    #[test]
    fn emitter_threads_wires() {
        let sig = Signature::new(vec![Register::thru("x", 2u32)]).unwrap();
        let mut bb = WiringBuilder::new(sig).unwrap();
        let x = bb.input("x").unwrap();
        let mut em = SlotEmitter::new(&mut bb);
        let xs = em.load_split(x).unwrap();
        let anc = em.reserve(1);
        let mut p = Program::default();
        p.and(xs.start, xs.start + 1, anc.start);
        p.and_adjoint(xs.start, xs.start + 1, anc.start);
        p.swap(xs.start, xs.start + 1);
        em.run(&p).unwrap();
        let x = em.take_join(xs).unwrap();
        em.finish().unwrap();
        let graph = bb.finish_whole(&[("x", x)]).unwrap();
        assert_eq!(graph.bloq_counts()[&Bloq::AND], 1);
        assert_eq!(graph.bloq_counts()[&Bloq::AND_ADJOINT], 1);
    }

    #[test]
    fn emitter_rejects_occupied_and_target() {
        let sig = Signature::new(vec![Register::thru("x", 3u32)]).unwrap();
        let mut bb = WiringBuilder::new(sig).unwrap();
        let x = bb.input("x").unwrap();
        let mut em = SlotEmitter::new(&mut bb);
        let xs = em.load_split(x).unwrap();
        let mut p = Program::default();
        p.and(xs.start, xs.start + 1, xs.start + 2);
        assert!(em.run(&p).is_err());
    }

    #[test]
    fn finish_reports_leftover_slot() {
        let sig = Signature::new(vec![Register::thru("x", 1u32)]).unwrap();
        let mut bb = WiringBuilder::new(sig).unwrap();
        let x = bb.input("x").unwrap();
        let mut em = SlotEmitter::new(&mut bb);
        em.load_bits(vec![x]);
        assert!(matches!(em.finish(), Err(SignatureMismatchError::DanglingWire { .. })));
    }
}
