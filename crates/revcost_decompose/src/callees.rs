//! Direct children of a node, with multiplicities.
//!
//! Concrete composites are counted from their wiring graph. Symbolic ones use
//! closed forms that mirror the rules; where the exact count depends on a
//! concrete value the closed form is an upper bound and says so.

use crate::add_k::load_gate;
use crate::error::{DecomposeError, RuleResult};
use revcost_common::SymInt;
use revcost_ir::{
    Add, AddK, Bloq, GF2Multiplication, GF2PartialProduct, GF2Reduction, OutOfPlaceAdder, ProductPart, WiringGraph,
};
use std::collections::BTreeMap;

/// The direct children of one node.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Callees {
    /// Child nodes and how many times each occurs, ordered by node.
    pub counts: Vec<(Bloq, SymInt)>,
    /// Whether some count is an upper bound rather than exact.
    pub upper_bound: bool,
}

impl Callees {
    /// Counts the child instances of a wiring graph.
    pub fn from_graph(graph: &WiringGraph) -> Self {
        Self {
            counts: graph
                .bloq_counts()
                .into_iter()
                .map(|(bloq, n)| (bloq, SymInt::from(n)))
                .collect(),
            upper_bound: false,
        }
    }

    /// Returns `true` for nodes with no children.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Multiplicity of `bloq`, zero if absent.
    pub fn count_of(&self, bloq: &Bloq) -> SymInt {
        self.counts
            .iter()
            .find(|(b, _)| b == bloq)
            .map(|(_, n)| n.clone())
            .unwrap_or_default()
    }
}

/// Accumulates counts, merging repeated nodes.
#[derive(Default)]
struct Tally {
    counts: BTreeMap<Bloq, SymInt>,
    upper_bound: bool,
}

impl Tally {
    fn add(&mut self, bloq: Bloq, n: SymInt) {
        if n.as_i64() == Some(0) {
            return;
        }
        *self.counts.entry(bloq).or_default() += n;
    }

    fn once(&mut self, bloq: Bloq) {
        self.add(bloq, SymInt::lit(1));
    }

    /// One split and one join of a register of width `w`.
    fn split_join(&mut self, w: &SymInt) {
        self.once(Bloq::Split { bitwidth: w.clone() });
        self.once(Bloq::Join { bitwidth: w.clone() });
    }

    fn finish(self) -> Callees {
        Callees {
            counts: self.counts.into_iter().collect(),
            upper_bound: self.upper_bound,
        }
    }
}

fn add(add: &Add) -> Callees {
    let n = add.b_bitwidth();
    let one = SymInt::lit(1);
    let mut t = Tally::default();
    t.add(Bloq::AND, n - &one);
    t.add(Bloq::AND_ADJOINT, n - &one);
    t.add(Bloq::Cnot, n * 6 - SymInt::lit(9));
    t.split_join(add.a_bitwidth());
    t.split_join(n);
    t.upper_bound = add.a_bitwidth() != n;
    t.finish()
}

fn out_of_place(oop: &OutOfPlaceAdder) -> Callees {
    let n = oop.bitwidth();
    let out = oop.out_bitwidth();
    let carry = i64::from(oop.include_carry_bit());
    let mut t = Tally::default();
    t.add(
        Bloq::And {
            uncompute: oop.is_adjoint(),
        },
        &out - &SymInt::lit(1),
    );
    t.add(Bloq::Cnot, n * 5 - SymInt::lit(3 - 3 * carry));
    t.split_join(n);
    t.split_join(n);
    let one = SymInt::lit(1);
    if oop.is_adjoint() {
        t.once(Bloq::Split { bitwidth: out });
        t.once(Bloq::Free { bitwidth: one });
    } else {
        t.once(Bloq::Allocate { bitwidth: one });
        t.once(Bloq::Join { bitwidth: out });
    }
    t.finish()
}

fn add_k(add_k: &AddK) -> RuleResult<Callees> {
    let n = add_k.bitwidth();
    let mut t = Tally::default();
    let loads = match add_k.k().as_i64() {
        Some(k) if k >= 0 => SymInt::lit(2 * i64::from(k.count_ones())),
        _ => {
            t.upper_bound = true;
            n * 2
        }
    };
    t.add(load_gate(add_k.cvs())?, loads);
    t.once(Bloq::Add(Add::symmetric(n.clone())?.with_signed(add_k.is_signed())?));
    t.once(Bloq::Allocate { bitwidth: n.clone() });
    t.once(Bloq::Free { bitwidth: n.clone() });
    t.split_join(n);
    t.split_join(n);
    Ok(t.finish())
}

fn multiplication(mul: &GF2Multiplication) -> RuleResult<Callees> {
    let m = mul.bitsize();
    let mut t = Tally::default();
    t.once(Bloq::GF2PartialProduct(GF2PartialProduct::new(m.clone(), ProductPart::Upper)?));
    t.once(Bloq::GF2Reduction(GF2Reduction::new(m.clone())?));
    t.once(Bloq::GF2PartialProduct(GF2PartialProduct::new(m.clone(), ProductPart::Lower)?));
    if mul.plus_equal_prod() {
        t.once(Bloq::GF2Reduction(GF2Reduction::new(m.clone())?.adjoint()));
    } else {
        t.once(Bloq::Allocate { bitwidth: m.clone() });
    }
    Ok(t.finish())
}

fn partial_product(pp: &GF2PartialProduct) -> Callees {
    let m = pp.bitsize();
    let square = m.pow(2);
    let toffolis = match pp.part() {
        ProductPart::Upper => (&square - m).half(),
        ProductPart::Lower => (&square + m).half(),
    };
    let mut t = Tally::default();
    t.add(Bloq::Toffoli, toffolis);
    for _ in 0..3 {
        t.split_join(m);
    }
    t.finish()
}

fn reduction(red: &GF2Reduction) -> Callees {
    let m = red.bitsize();
    let mut t = Tally::default();
    t.add(Bloq::Cnot, &m.pow(2) - m);
    t.split_join(m);
    t.upper_bound = true;
    t.finish()
}

/// Closed-form callees of a composite; empty for elementary nodes.
pub(crate) fn closed_form(bloq: &Bloq) -> Result<Callees, DecomposeError> {
    let callees = match bloq {
        Bloq::Add(a) => add(a),
        Bloq::OutOfPlaceAdder(oop) => out_of_place(oop),
        Bloq::AddK(k) => add_k(k).map_err(|e| e.at(bloq))?,
        Bloq::GF2Multiplication(mul) => multiplication(mul).map_err(|e| e.at(bloq))?,
        Bloq::GF2PartialProduct(pp) => partial_product(pp),
        Bloq::GF2Reduction(red) => reduction(red),
        _ => Callees::default(),
    };
    Ok(callees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> SymInt {
        SymInt::symbol("n")
    }

    #[test]
    fn symbolic_add() {
        let c = closed_form(&Bloq::Add(Add::symmetric(n()).unwrap())).unwrap();
        assert_eq!(c.count_of(&Bloq::AND).to_string(), "n - 1");
        assert_eq!(c.count_of(&Bloq::Cnot).to_string(), "6*n - 9");
        assert_eq!(c.count_of(&Bloq::Split { bitwidth: n() }), SymInt::lit(2));
        assert!(!c.upper_bound);

        let c = closed_form(&Bloq::Add(Add::new(SymInt::symbol("a"), n()).unwrap())).unwrap();
        assert!(c.upper_bound);
    }

    #[test]
    fn symbolic_out_of_place() {
        let fwd = OutOfPlaceAdder::new(n()).unwrap();
        let c = closed_form(&Bloq::OutOfPlaceAdder(fwd.clone())).unwrap();
        assert_eq!(c.count_of(&Bloq::AND), n());
        assert_eq!(c.count_of(&Bloq::Cnot).to_string(), "5*n");
        let c = closed_form(&Bloq::OutOfPlaceAdder(fwd.with_carry_bit(false).adjoint())).unwrap();
        assert_eq!(c.count_of(&Bloq::AND_ADJOINT).to_string(), "n - 1");
        assert_eq!(c.count_of(&Bloq::AND), SymInt::lit(0));
        assert_eq!(c.count_of(&Bloq::Cnot).to_string(), "5*n - 3");
    }

    #[test]
    fn symbolic_add_k_bounds_load() {
        let c = closed_form(&Bloq::AddK(AddK::new(n(), 5i64, false).unwrap())).unwrap();
        assert_eq!(c.count_of(&Bloq::XGate), SymInt::lit(4));
        assert!(!c.upper_bound);
        let c = closed_form(&Bloq::AddK(AddK::new(n(), SymInt::symbol("k"), false).unwrap())).unwrap();
        assert_eq!(c.count_of(&Bloq::XGate).to_string(), "2*n");
        assert!(c.upper_bound);
    }

    #[test]
    fn symbolic_gf2() {
        let m = SymInt::symbol("m");
        let upper = GF2PartialProduct::new(m.clone(), ProductPart::Upper).unwrap();
        let c = closed_form(&Bloq::GF2PartialProduct(upper)).unwrap();
        assert_eq!(c.count_of(&Bloq::Toffoli).to_string(), "m**2/2 - m/2");
        let red = closed_form(&Bloq::GF2Reduction(GF2Reduction::new(m.clone()).unwrap())).unwrap();
        assert_eq!(red.count_of(&Bloq::Cnot).to_string(), "m**2 - m");
        let mul = closed_form(&Bloq::GF2Multiplication(GF2Multiplication::new(m, true).unwrap())).unwrap();
        assert_eq!(mul.counts.len(), 4);
    }

    #[test]
    fn elementary_has_no_callees() {
        assert!(closed_form(&Bloq::Toffoli).unwrap().is_empty());
    }
}
