//! Wiring graphs: the composite form of a decomposition.
//!
//! A [`WiringGraph`] stores child instances and the wires between them in two
//! arenas. Every wire has exactly one producer (a parent input register or a
//! child output register) and exactly one consumer (a child input register or
//! a parent output register). Instances are stored in creation order, which is
//! a topological order because a wire can only be consumed after it exists.
//!
//! Graphs are built with a [`WiringBuilder`], which hands out [`WireId`]s for
//! the parent's inputs, consumes wires as children are added, and checks widths
//! and register names on every connection.

use crate::arena::Arena;
use crate::bloq::Bloq;
use crate::error::SignatureMismatchError;
use crate::ids::{NodeId, WireId};
use crate::register::{Register, Shape, Signature};
use revcost_common::SymInt;
use serde::Serialize;
use std::collections::BTreeMap;

/// One end of a wire.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum Port {
    /// A register of the parent signature.
    Boundary {
        /// Register name.
        register: String,
        /// Bit index for per-bit registers.
        bit: Option<u32>,
    },
    /// A register of a child instance.
    Node {
        /// The child instance.
        node: NodeId,
        /// Register name.
        register: String,
        /// Bit index for per-bit registers.
        bit: Option<u32>,
    },
}

/// A wire carrying `bitwidth` bits from `source` to `sink`.
#[derive(Clone, Debug, Serialize)]
pub struct Wire {
    /// Number of bits carried.
    pub bitwidth: u32,
    /// The producing port.
    pub source: Port,
    /// The consuming port; `None` only while a graph is under construction.
    pub sink: Option<Port>,
}

/// The wires attached to one register of an instance or the boundary.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Connection {
    /// Register name.
    pub register: String,
    /// One wire for whole registers, one per bit for per-bit registers.
    pub wires: Vec<WireId>,
}

/// A child operation node placed in a wiring graph.
#[derive(Clone, Debug, Serialize)]
pub struct Instance {
    /// The child node.
    pub bloq: Bloq,
    /// Wires consumed, in signature order.
    pub inputs: Vec<Connection>,
    /// Wires produced, in signature order.
    pub outputs: Vec<Connection>,
}

/// A validated DAG of child instances with the parent's signature.
#[derive(Clone, Debug, Serialize)]
pub struct WiringGraph {
    signature: Signature,
    wires: Arena<WireId, Wire>,
    nodes: Arena<NodeId, Instance>,
    inputs: Vec<Connection>,
    outputs: Vec<Connection>,
}

impl WiringGraph {
    /// The external signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Child instances in topological order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Instance)> {
        self.nodes.iter()
    }

    /// Number of child instances.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a child instance.
    pub fn node(&self, id: NodeId) -> &Instance {
        &self.nodes[id]
    }

    /// Looks up a wire.
    pub fn wire(&self, id: WireId) -> &Wire {
        &self.wires[id]
    }

    /// All wires in creation order.
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter()
    }

    /// Wires leaving the parent's input registers.
    pub fn inputs(&self) -> &[Connection] {
        &self.inputs
    }

    /// Wires entering the parent's output registers.
    pub fn outputs(&self) -> &[Connection] {
        &self.outputs
    }

    /// Counts child instances by node.
    pub fn bloq_counts(&self) -> BTreeMap<Bloq, u64> {
        let mut counts = BTreeMap::new();
        for inst in self.nodes.values() {
            *counts.entry(inst.bloq.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Total width of the wires leaving the boundary.
    pub fn input_bits(&self) -> u32 {
        self.connection_bits(&self.inputs)
    }

    /// Total width of the wires entering the boundary.
    pub fn output_bits(&self) -> u32 {
        self.connection_bits(&self.outputs)
    }

    fn connection_bits(&self, conns: &[Connection]) -> u32 {
        conns
            .iter()
            .flat_map(|c| c.wires.iter())
            .map(|w| self.wires[*w].bitwidth)
            .sum()
    }

    /// Re-checks every structural invariant of the graph.
    ///
    /// Every wire is consumed, every child connection matches the child's
    /// signature, and the boundary matches the parent's signature both by
    /// register and in total input/output bit counts.
    pub fn validate(&self) -> Result<(), SignatureMismatchError> {
        if let Some((id, _)) = self.wires.iter().find(|(_, w)| w.sink.is_none()) {
            return Err(SignatureMismatchError::DanglingWire { wire: id.to_string() });
        }
        let parent = "boundary";
        check_connections(parent, self.signature.lefts(), &self.inputs, &self.wires)?;
        check_connections(parent, self.signature.rights(), &self.outputs, &self.wires)?;
        for inst in self.nodes.values() {
            let sig = inst.bloq.signature();
            let name = inst.bloq.to_string();
            check_connections(&name, sig.lefts(), &inst.inputs, &self.wires)?;
            check_connections(&name, sig.rights(), &inst.outputs, &self.wires)?;
        }
        let expected_in = self.signature.n_input_bits();
        let expected_out = self.signature.n_output_bits();
        if expected_in != SymInt::from(self.input_bits()) || expected_out != SymInt::from(self.output_bits()) {
            return Err(SignatureMismatchError::SignatureDiffers {
                op: parent.to_string(),
                expected: format!("{expected_in} -> {expected_out} bits"),
                found: format!("{} -> {} bits", self.input_bits(), self.output_bits()),
            });
        }
        Ok(())
    }
}

fn concrete_width(op: &str, reg: &Register) -> Result<u32, SignatureMismatchError> {
    reg.bitwidth()
        .as_u32()
        .ok_or_else(|| SignatureMismatchError::SymbolicWidth {
            register: format!("{op}.{}", reg.name()),
            bitwidth: reg.bitwidth().clone(),
        })
}

/// Wire widths a register needs: `[w]` for whole, `[1; w]` for per-bit.
fn wire_widths(op: &str, reg: &Register) -> Result<Vec<u32>, SignatureMismatchError> {
    let width = concrete_width(op, reg)?;
    Ok(match reg.shape() {
        Shape::Whole => vec![width],
        Shape::PerBit => vec![1; width as usize],
    })
}

fn check_widths(reg: &Register, op: &str, wires: &[WireId], widths: &[u32], actual: impl Fn(WireId) -> Option<u32>) -> Result<(), SignatureMismatchError> {
    if wires.len() != widths.len() {
        return Err(SignatureMismatchError::WireCountMismatch {
            register: format!("{op}.{}", reg.name()),
            expected: widths.len(),
            found: wires.len(),
        });
    }
    for (&wire, &expected) in wires.iter().zip(widths) {
        let found = actual(wire).ok_or_else(|| SignatureMismatchError::WireReused { wire: wire.to_string() })?;
        if found != expected {
            return Err(SignatureMismatchError::WidthMismatch {
                register: format!("{op}.{}", reg.name()),
                expected,
                found,
                wire: wire.to_string(),
            });
        }
    }
    Ok(())
}

fn check_connections<'a>(
    op: &str,
    regs: impl Iterator<Item = &'a Register>,
    conns: &[Connection],
    wires: &Arena<WireId, Wire>,
) -> Result<(), SignatureMismatchError> {
    let regs: Vec<&Register> = regs.collect();
    if regs.len() != conns.len() {
        return Err(SignatureMismatchError::WireCountMismatch {
            register: format!("{op}.*"),
            expected: regs.len(),
            found: conns.len(),
        });
    }
    for (reg, conn) in regs.into_iter().zip(conns) {
        if reg.name() != conn.register {
            return Err(SignatureMismatchError::MissingRegister {
                op: op.to_string(),
                register: reg.name().to_string(),
            });
        }
        let widths = wire_widths(op, reg)?;
        check_widths(reg, op, &conn.wires, &widths, |w| wires.try_get(w).map(|w| w.bitwidth))?;
    }
    Ok(())
}

/// Incrementally builds a [`WiringGraph`] for a given parent signature.
///
/// Wires are linear: each [`WireId`] returned by the builder must be passed
/// to exactly one later `add*` call or to [`finish`](Self::finish).
#[derive(Debug)]
pub struct WiringBuilder {
    signature: Signature,
    wires: Arena<WireId, Wire>,
    nodes: Arena<NodeId, Instance>,
    inputs: Vec<Connection>,
}

impl WiringBuilder {
    /// Starts a graph, creating wires for every input register of `signature`.
    pub fn new(signature: Signature) -> Result<Self, SignatureMismatchError> {
        let mut builder = Self {
            signature,
            wires: Arena::new(),
            nodes: Arena::new(),
            inputs: Vec::new(),
        };
        let lefts: Vec<Register> = builder.signature.lefts().cloned().collect();
        for reg in lefts {
            let widths = wire_widths("boundary", &reg)?;
            let per_bit = reg.shape() == Shape::PerBit;
            let wires = widths
                .into_iter()
                .enumerate()
                .map(|(i, bitwidth)| {
                    builder.wires.alloc(Wire {
                        bitwidth,
                        source: Port::Boundary {
                            register: reg.name().to_string(),
                            bit: per_bit.then_some(i as u32),
                        },
                        sink: None,
                    })
                })
                .collect();
            builder.inputs.push(Connection {
                register: reg.name().to_string(),
                wires,
            });
        }
        Ok(builder)
    }

    /// The parent signature being implemented.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The wires of a parent input register.
    pub fn input_wires(&self, register: &str) -> Result<Vec<WireId>, SignatureMismatchError> {
        self.inputs
            .iter()
            .find(|c| c.register == register)
            .map(|c| c.wires.clone())
            .ok_or_else(|| SignatureMismatchError::UnknownRegister {
                op: "boundary".to_string(),
                register: register.to_string(),
            })
    }

    /// The single wire of a whole parent input register.
    pub fn input(&self, register: &str) -> Result<WireId, SignatureMismatchError> {
        let [wire] = expect_n(register, self.input_wires(register)?)?;
        Ok(wire)
    }

    /// Width of a wire created by this builder.
    pub fn width(&self, wire: WireId) -> Option<u32> {
        self.wires.try_get(wire).map(|w| w.bitwidth)
    }

    /// Marks `wire` consumed by `sink`, failing if it is unknown or already consumed.
    fn consume(&mut self, wire: WireId, sink: Port) -> Result<(), SignatureMismatchError> {
        match self.wires.try_get_mut(wire) {
            Some(w) if w.sink.is_none() => {
                w.sink = Some(sink);
                Ok(())
            }
            _ => Err(SignatureMismatchError::WireReused { wire: wire.to_string() }),
        }
    }

    /// Checks and consumes the given connections against `regs`.
    fn connect(
        &mut self,
        op: &str,
        regs: &[Register],
        given: &[(&str, &[WireId])],
        side: &'static str,
        make_port: impl Fn(&str, Option<u32>) -> Port,
    ) -> Result<Vec<Connection>, SignatureMismatchError> {
        for (name, _) in given {
            if !regs.iter().any(|r| r.name() == *name) {
                return Err(SignatureMismatchError::DirectionMismatch {
                    op: op.to_string(),
                    register: name.to_string(),
                    side,
                });
            }
        }
        let mut conns = Vec::with_capacity(regs.len());
        for reg in regs {
            let wires = given
                .iter()
                .find(|(name, _)| *name == reg.name())
                .map(|(_, wires)| wires.to_vec())
                .ok_or_else(|| SignatureMismatchError::MissingRegister {
                    op: op.to_string(),
                    register: reg.name().to_string(),
                })?;
            let widths = wire_widths(op, reg)?;
            check_widths(reg, op, &wires, &widths, |w| self.width(w))?;
            let per_bit = reg.shape() == Shape::PerBit;
            for (i, &wire) in wires.iter().enumerate() {
                self.consume(wire, make_port(reg.name(), per_bit.then_some(i as u32)))?;
            }
            conns.push(Connection {
                register: reg.name().to_string(),
                wires,
            });
        }
        Ok(conns)
    }

    /// Adds a child instance, consuming its input wires and returning its outputs.
    ///
    /// `inputs` maps each input register name of `bloq` to its wires. Output
    /// connections come back in signature order.
    pub fn add(&mut self, bloq: Bloq, inputs: &[(&str, &[WireId])]) -> Result<Vec<Connection>, SignatureMismatchError> {
        let sig = bloq.signature();
        let name = bloq.to_string();
        if let Some(reg) = sig.iter().find(|r| !r.bitwidth().is_concrete()) {
            return Err(SignatureMismatchError::SymbolicWidth {
                register: format!("{name}.{}", reg.name()),
                bitwidth: reg.bitwidth().clone(),
            });
        }
        let node = self.nodes.next_id();
        let lefts: Vec<Register> = sig.lefts().cloned().collect();
        let input_conns = self.connect(&name, &lefts, inputs, "input", |register, bit| Port::Node {
            node,
            register: register.to_string(),
            bit,
        })?;
        let mut output_conns = Vec::new();
        for reg in sig.rights() {
            let per_bit = reg.shape() == Shape::PerBit;
            let wires = wire_widths(&name, reg)?
                .into_iter()
                .enumerate()
                .map(|(i, bitwidth)| {
                    self.wires.alloc(Wire {
                        bitwidth,
                        source: Port::Node {
                            node,
                            register: reg.name().to_string(),
                            bit: per_bit.then_some(i as u32),
                        },
                        sink: None,
                    })
                })
                .collect();
            output_conns.push(Connection {
                register: reg.name().to_string(),
                wires,
            });
        }
        self.nodes.alloc(Instance {
            bloq,
            inputs: input_conns,
            outputs: output_conns.clone(),
        });
        Ok(output_conns)
    }

    /// Adds a child whose registers are all whole, returning the output wires
    /// in signature order.
    pub fn add_whole(&mut self, bloq: Bloq, inputs: &[(&str, WireId)]) -> Result<Vec<WireId>, SignatureMismatchError> {
        let singles: Vec<[WireId; 1]> = inputs.iter().map(|(_, w)| [*w]).collect();
        let given: Vec<(&str, &[WireId])> = inputs
            .iter()
            .zip(&singles)
            .map(|((name, _), wire)| (*name, wire.as_slice()))
            .collect();
        let outputs = self.add(bloq, &given)?;
        Ok(outputs.into_iter().flat_map(|c| c.wires).collect())
    }

    /// [`add_whole`](Self::add_whole) for a child with exactly `N` output registers.
    pub fn add_n<const N: usize>(&mut self, bloq: Bloq, inputs: &[(&str, WireId)]) -> Result<[WireId; N], SignatureMismatchError> {
        let op = bloq.to_string();
        expect_n(&op, self.add_whole(bloq, inputs)?)
    }

    /// Flips one bit.
    pub fn x(&mut self, q: WireId) -> Result<WireId, SignatureMismatchError> {
        let [q] = expect_n("X", self.add_whole(Bloq::XGate, &[("q", q)])?)?;
        Ok(q)
    }

    /// `target ^= ctrl`.
    pub fn cnot(&mut self, ctrl: WireId, target: WireId) -> Result<(WireId, WireId), SignatureMismatchError> {
        let [c, t] = expect_n("CNOT", self.add_whole(Bloq::Cnot, &[("ctrl", ctrl), ("target", target)])?)?;
        Ok((c, t))
    }

    /// `target ^= ctrl0 & ctrl1`.
    pub fn toffoli(&mut self, ctrl0: WireId, ctrl1: WireId, target: WireId) -> Result<(WireId, WireId, WireId), SignatureMismatchError> {
        let outs = self.add_whole(Bloq::Toffoli, &[("ctrl0", ctrl0), ("ctrl1", ctrl1), ("target", target)])?;
        let [c0, c1, t] = expect_n("Toffoli", outs)?;
        Ok((c0, c1, t))
    }

    /// Computes `ctrl0 & ctrl1` into a fresh wire.
    pub fn and(&mut self, ctrl0: WireId, ctrl1: WireId) -> Result<(WireId, WireId, WireId), SignatureMismatchError> {
        let outs = self.add_whole(Bloq::AND, &[("ctrl0", ctrl0), ("ctrl1", ctrl1)])?;
        let [c0, c1, t] = expect_n("And", outs)?;
        Ok((c0, c1, t))
    }

    /// Uncomputes a target produced by [`and`](Self::and).
    pub fn and_adjoint(&mut self, ctrl0: WireId, ctrl1: WireId, target: WireId) -> Result<(WireId, WireId), SignatureMismatchError> {
        let outs = self.add_whole(Bloq::AND_ADJOINT, &[("ctrl0", ctrl0), ("ctrl1", ctrl1), ("target", target)])?;
        let [c0, c1] = expect_n("And†", outs)?;
        Ok((c0, c1))
    }

    /// Splits a wire into single-bit wires, least significant first.
    pub fn split(&mut self, wire: WireId) -> Result<Vec<WireId>, SignatureMismatchError> {
        let width = self
            .width(wire)
            .ok_or_else(|| SignatureMismatchError::WireReused { wire: wire.to_string() })?;
        self.add_whole(Bloq::Split { bitwidth: SymInt::from(width) }, &[("reg", wire)])
    }

    /// Joins single-bit wires, least significant first, into one wire.
    pub fn join(&mut self, bits: &[WireId]) -> Result<WireId, SignatureMismatchError> {
        let bitwidth = SymInt::from(bits.len());
        let outs = self.add(Bloq::Join { bitwidth }, &[("bits", bits)])?;
        let [wire] = expect_n("Join", outs.into_iter().flat_map(|c| c.wires).collect())?;
        Ok(wire)
    }

    /// Produces a zeroed wire of `bitwidth` bits.
    pub fn allocate(&mut self, bitwidth: u32) -> Result<WireId, SignatureMismatchError> {
        let [wire] = expect_n("Allocate", self.add_whole(Bloq::Allocate { bitwidth: bitwidth.into() }, &[])?)?;
        Ok(wire)
    }

    /// Consumes a wire that must hold zero.
    pub fn free(&mut self, wire: WireId) -> Result<(), SignatureMismatchError> {
        let width = self
            .width(wire)
            .ok_or_else(|| SignatureMismatchError::WireReused { wire: wire.to_string() })?;
        self.add_whole(Bloq::Free { bitwidth: width.into() }, &[("reg", wire)])?;
        Ok(())
    }

    /// Connects the parent's output registers and returns the finished graph.
    ///
    /// Fails if an output register is missing or mis-sized, or if any wire
    /// produced inside the graph is left unconsumed.
    pub fn finish(mut self, outputs: &[(&str, &[WireId])]) -> Result<WiringGraph, SignatureMismatchError> {
        let rights: Vec<Register> = self.signature.rights().cloned().collect();
        let outputs = self.connect("boundary", &rights, outputs, "output", |register, bit| Port::Boundary {
            register: register.to_string(),
            bit,
        })?;
        let graph = WiringGraph {
            signature: self.signature,
            wires: self.wires,
            nodes: self.nodes,
            inputs: self.inputs,
            outputs,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// [`finish`](Self::finish) for a signature whose outputs are all whole.
    pub fn finish_whole(self, outputs: &[(&str, WireId)]) -> Result<WiringGraph, SignatureMismatchError> {
        let singles: Vec<[WireId; 1]> = outputs.iter().map(|(_, w)| [*w]).collect();
        let given: Vec<(&str, &[WireId])> = outputs
            .iter()
            .zip(&singles)
            .map(|((name, _), wire)| (*name, wire.as_slice()))
            .collect();
        self.finish(&given)
    }
}

fn expect_n<const N: usize>(op: &str, wires: Vec<WireId>) -> Result<[WireId; N], SignatureMismatchError> {
    let found = wires.len();
    <[WireId; N]>::try_from(wires).map_err(|_| SignatureMismatchError::WireCountMismatch {
        register: op.to_string(),
        expected: N,
        found,
    })
}
