//! Recursive evaluation of nodes and wiring graphs.
//!
//! [`Simulator::run`] evaluates elementary nodes directly and composites by
//! decomposing them and evaluating the resulting graph. Wire values live in a
//! map keyed by [`WireId`]; because wires are linear each value is removed
//! when its consumer reads it.

use crate::error::SimError;
use crate::gates;
use revcost_common::Bits;
use revcost_decompose::{decompose, DecomposeError, Decomposition};
use revcost_ir::{Bloq, Connection, Signature, WireId, WiringGraph};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Register values keyed by register name.
///
/// Per-bit registers hold one value of the full width.
pub type Values = BTreeMap<String, Bits>;

/// Builds a [`Values`] map from `(name, value)` pairs.
pub fn values<'a>(pairs: impl IntoIterator<Item = (&'a str, Bits)>) -> Values {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub(crate) fn input<'v>(op: &str, inputs: &'v Values, register: &str) -> Result<&'v Bits, SimError> {
    inputs.get(register).ok_or_else(|| SimError::MissingInput {
        op: op.to_string(),
        register: register.to_string(),
    })
}

/// Checks that `inputs` holds exactly the input registers of `sig` at their widths.
pub(crate) fn check_inputs(op: &str, sig: &Signature, inputs: &Values) -> Result<(), SimError> {
    for reg in sig.lefts() {
        let expected = reg.bitwidth().as_u32().ok_or_else(|| SimError::Symbolic { bloq: op.to_string() })?;
        let found = input(op, inputs, reg.name())?.width();
        if found != expected {
            return Err(SimError::WidthMismatch {
                op: op.to_string(),
                register: reg.name().to_string(),
                expected,
                found,
            });
        }
    }
    if let Some(extra) = inputs.keys().find(|k| !sig.lefts().any(|r| r.name() == k.as_str())) {
        return Err(SimError::UnexpectedInput {
            op: op.to_string(),
            register: extra.clone(),
        });
    }
    Ok(())
}

/// Evaluates nodes, caching the decomposition of every composite it meets.
#[derive(Debug, Default)]
pub struct Simulator {
    graphs: HashMap<Bloq, Rc<WiringGraph>>,
}

impl Simulator {
    /// Creates a simulator with an empty decomposition cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `bloq` on its input registers, returning its output registers.
    pub fn run(&mut self, bloq: &Bloq, inputs: &Values) -> Result<Values, SimError> {
        check_inputs(&bloq.to_string(), &bloq.signature(), inputs)?;
        if bloq.is_elementary() {
            return gates::eval(bloq, inputs);
        }
        let graph = self.graph(bloq)?;
        self.run_graph(&graph, inputs)
    }

    fn graph(&mut self, bloq: &Bloq) -> Result<Rc<WiringGraph>, SimError> {
        if let Some(graph) = self.graphs.get(bloq) {
            return Ok(Rc::clone(graph));
        }
        let graph = match decompose(bloq) {
            Ok(Decomposition::Composite(graph)) => Rc::new(graph),
            Ok(Decomposition::Elementary) => return Err(SimError::NoReference { bloq: bloq.to_string() }),
            Err(DecomposeError::Symbolic { bloq }) => return Err(SimError::Symbolic { bloq }),
            Err(e) => return Err(e.into()),
        };
        self.graphs.insert(bloq.clone(), Rc::clone(&graph));
        Ok(graph)
    }

    /// Evaluates a wiring graph on the parent's input registers.
    pub fn run_graph(&mut self, graph: &WiringGraph, inputs: &Values) -> Result<Values, SimError> {
        check_inputs("boundary", graph.signature(), inputs)?;
        let mut wires: HashMap<WireId, Bits> = HashMap::new();
        for conn in graph.inputs() {
            distribute(graph, conn, input("boundary", inputs, &conn.register)?, &mut wires);
        }
        for (_, inst) in graph.nodes() {
            let child_inputs = inst
                .inputs
                .iter()
                .map(|conn| Ok((conn.register.clone(), gather(conn, &mut wires)?)))
                .collect::<Result<Values, SimError>>()?;
            let outputs = self.run(&inst.bloq, &child_inputs)?;
            let op = inst.bloq.to_string();
            for conn in &inst.outputs {
                distribute(graph, conn, input(&op, &outputs, &conn.register)?, &mut wires);
            }
        }
        graph
            .outputs()
            .iter()
            .map(|conn| Ok((conn.register.clone(), gather(conn, &mut wires)?)))
            .collect()
    }
}

/// Slices a register value onto the wires of a connection.
fn distribute(graph: &WiringGraph, conn: &Connection, value: &Bits, wires: &mut HashMap<WireId, Bits>) {
    let mut offset = 0;
    for &wire in &conn.wires {
        let width = graph.wire(wire).bitwidth;
        wires.insert(wire, value.slice(offset, width));
        offset += width;
    }
}

/// Takes the values off the wires of a connection and concatenates them.
fn gather(conn: &Connection, wires: &mut HashMap<WireId, Bits>) -> Result<Bits, SimError> {
    let parts = conn
        .wires
        .iter()
        .map(|w| {
            wires.remove(w).ok_or_else(|| SimError::MissingInput {
                op: "wire".to_string(),
                register: w.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Bits::concat(&parts))
}

/// Evaluates `bloq` with a fresh [`Simulator`].
pub fn simulate(bloq: &Bloq, inputs: &Values) -> Result<Values, SimError> {
    Simulator::new().run(bloq, inputs)
}

/// Evaluates a wiring graph with a fresh [`Simulator`].
pub fn simulate_graph(graph: &WiringGraph, inputs: &Values) -> Result<Values, SimError> {
    Simulator::new().run_graph(graph, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcost_ir::{Add, AddK, OutOfPlaceAdder, Register, WiringBuilder};

    fn add(bloq: &Bloq, a: u128, b: u128, wa: u32, wb: u32) -> u128 {
        let out = simulate(bloq, &values([("a", Bits::from_u128(a, wa)), ("b", Bits::from_u128(b, wb))])).unwrap();
        assert_eq!(out["a"], Bits::from_u128(a, wa), "a must be preserved");
        out["b"].to_u128().unwrap()
    }

    #[test]
    fn add_four_bits_exhaustive() {
        let bloq = Bloq::Add(Add::symmetric(4u32).unwrap());
        for a in 0..16 {
            for b in 0..16 {
                assert_eq!(add(&bloq, a, b, 4, 4), (a + b) % 16);
            }
        }
    }

    #[test]
    fn add_drops_overflow_of_wide_a() {
        let bloq = Bloq::Add(Add::new(5u32, 3u32).unwrap());
        assert_eq!(add(&bloq, 0b11111, 0b001, 5, 3), 0);
        assert_eq!(add(&bloq, 0b10110, 0b011, 5, 3), 0b001);
    }

    #[test]
    fn out_of_place_forward_then_adjoint() {
        let fwd = OutOfPlaceAdder::new(3u32).unwrap();
        let mut sim = Simulator::new();
        for (a, b) in [(0u128, 0u128), (7, 7), (5, 2), (3, 6)] {
            let ins = values([("a", Bits::from_u128(a, 3)), ("b", Bits::from_u128(b, 3))]);
            let out = sim.run(&Bloq::OutOfPlaceAdder(fwd.clone()), &ins).unwrap();
            assert_eq!(out["c"].to_u128(), Some(a + b));
            let back = sim.run(&Bloq::OutOfPlaceAdder(fwd.adjoint()), &out).unwrap();
            assert_eq!(back, ins);
        }
    }

    #[test]
    fn add_k_wraps() {
        let bloq = Bloq::AddK(AddK::new(4u32, 11i64, false).unwrap());
        for x in 0..16u128 {
            let out = simulate(&bloq, &values([("x", Bits::from_u128(x, 4))])).unwrap();
            assert_eq!(out["x"].to_u128(), Some((x + 11) % 16));
        }
    }

    #[test]
    fn input_checks() {
        let bloq = Bloq::Add(Add::symmetric(2u32).unwrap());
        let err = simulate(&bloq, &values([("a", Bits::new(2))])).unwrap_err();
        assert!(matches!(err, SimError::MissingInput { .. }));
        let err = simulate(&bloq, &values([("a", Bits::new(2)), ("b", Bits::new(3))])).unwrap_err();
        assert!(matches!(err, SimError::WidthMismatch { expected: 2, found: 3, .. }));
        let err = simulate(&bloq, &values([("a", Bits::new(2)), ("b", Bits::new(2)), ("c", Bits::new(1))])).unwrap_err();
        assert!(matches!(err, SimError::UnexpectedInput { .. }));
        let symbolic = Bloq::Add(Add::symmetric(revcost_common::SymInt::symbol("n")).unwrap());
        assert!(matches!(simulate(&symbolic, &Values::new()), Err(SimError::Symbolic { .. })));
    }

    #[test]
    fn hand_built_graph() {
        let sig = Signature::new(vec![Register::thru("q", 2u32)]).unwrap();
        let mut bb = WiringBuilder::new(sig).unwrap();
        let q = bb.input("q").unwrap();
        let bits = bb.split(q).unwrap();
        let (c, t) = bb.cnot(bits[0], bits[1]).unwrap();
        let q = bb.join(&[c, t]).unwrap();
        let graph = bb.finish_whole(&[("q", q)]).unwrap();
        let out = simulate_graph(&graph, &values([("q", Bits::from_u128(0b01, 2))])).unwrap();
        assert_eq!(out["q"].to_u128(), Some(0b11));
    }
}
