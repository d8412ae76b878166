//! Addition family: T-counts, reversibility and arithmetic on bit patterns.

use revcost_common::SymInt;
use revcost_conformance::{full_cost, read, run, t_count};
use revcost_ir::{Add, AddK, Bloq, ConfigurationError, OutOfPlaceAdder};

use proptest::{prop_assert_eq, proptest};

#[test]
fn add_t_count_is_4n_minus_4_for_all_concrete_widths() {
    for n in 1..=64i64 {
        let bloq = Bloq::Add(Add::symmetric(n).unwrap());
        assert_eq!(t_count(&bloq), SymInt::lit(4 * n - 4), "n = {n}");
    }
}

#[test]
fn add_t_count_symbolic() {
    let bloq = Bloq::Add(Add::symmetric(SymInt::symbol("n")).unwrap());
    let cost = full_cost(&bloq);
    assert_eq!(cost.counts.total_t_count().to_string(), "4*n - 4");
    assert!(cost.diagnostics.is_empty());
}

#[test]
fn mixed_width_add_is_flagged_as_upper_bound() {
    let bloq = Bloq::Add(Add::new(SymInt::symbol("a"), SymInt::symbol("b")).unwrap());
    let cost = full_cost(&bloq);
    assert!(cost.diagnostics.iter().any(|d| d.code.to_string() == "K001"));
}

#[test]
fn out_of_place_round_trip_restores_inputs() {
    for carry in [false, true] {
        let fwd = OutOfPlaceAdder::new(3u32).unwrap().with_carry_bit(carry);
        let out_w = 3 + carry as u32;
        for a in 0..8u128 {
            for b in 0..8u128 {
                let out = run(&Bloq::OutOfPlaceAdder(fwd.clone()), &[("a", a, 3), ("b", b, 3)]);
                assert_eq!(read(&out, "c"), (a + b) % (1 << out_w));
                let back = run(
                    &Bloq::OutOfPlaceAdder(fwd.adjoint()),
                    &[("a", a, 3), ("b", b, 3), ("c", read(&out, "c"), out_w)],
                );
                assert_eq!(read(&back, "a"), a);
                assert_eq!(read(&back, "b"), b);
                assert!(!back.contains_key("c"));
            }
        }
    }
}

#[test]
fn out_of_place_adjoint_costs_no_t() {
    for n in 1..=16u32 {
        let fwd = OutOfPlaceAdder::new(n).unwrap();
        assert_eq!(t_count(&Bloq::OutOfPlaceAdder(fwd.clone())), SymInt::from(4 * n));
        let no_carry = fwd.clone().with_carry_bit(false);
        assert_eq!(t_count(&Bloq::OutOfPlaceAdder(no_carry.clone())), SymInt::from(4 * n - 4));
        assert_eq!(t_count(&Bloq::OutOfPlaceAdder(fwd.adjoint())), SymInt::lit(0));
        assert_eq!(t_count(&Bloq::OutOfPlaceAdder(no_carry.adjoint())), SymInt::lit(0));
    }
}

#[test]
fn add_k_is_x_plus_k_mod_16() {
    for k in 0..16i64 {
        let bloq = Bloq::AddK(AddK::new(4u32, k, false).unwrap());
        for x in 0..16u128 {
            let out = run(&bloq, &[("x", x, 4)]);
            assert_eq!(read(&out, "x"), (x + k as u128) % 16, "x = {x}, k = {k}");
        }
    }
}

#[test]
fn signed_add_k_wraps_negative_constants() {
    let bloq = Bloq::AddK(AddK::new(4u32, -3i64, true).unwrap());
    for x in 0..16u128 {
        let out = run(&bloq, &[("x", x, 4)]);
        assert_eq!(read(&out, "x"), (x + 13) % 16);
    }
}

#[test]
fn controlled_add_k_only_adds_when_controls_match() {
    let bloq = Bloq::AddK(AddK::controlled(3u32, 5i64, false, vec![1, 0]).unwrap());
    for ctrls in 0..4u128 {
        for x in 0..8u128 {
            let out = run(&bloq, &[("ctrls", ctrls, 2), ("x", x, 3)]);
            // ctrls[0] = 1, ctrls[1] = 0 is the pattern 0b01.
            let expected = if ctrls == 0b01 { (x + 5) % 8 } else { x };
            assert_eq!(read(&out, "x"), expected);
            assert_eq!(read(&out, "ctrls"), ctrls);
        }
    }
}

#[test]
fn negative_unsigned_constant_is_rejected() {
    for k in [-1i64, -7, -100] {
        let err = AddK::new(4u32, k, false).unwrap_err();
        assert!(matches!(err, ConfigurationError::NegativeUnsignedConstant { .. }));
    }
    assert!(AddK::new(4u32, -1i64, true).is_ok());
}

#[test]
fn signed_add_with_wide_negative_a() {
    let bloq = Bloq::Add(Add::new(6u32, 3u32).unwrap().with_signed(true).unwrap());
    for a in [-1i64, -3, -32, 5] {
        let a_bits = (a as u128) & 0b11_1111;
        for b in 0..8i64 {
            let out = run(&bloq, &[("a", a_bits, 6), ("b", b as u128, 3)]);
            assert_eq!(read(&out, "a"), a_bits);
            assert_eq!(read(&out, "b"), ((a + b) as u128) & 0b111, "a = {a}, b = {b}");
        }
    }
}

#[test]
fn signed_add_with_narrow_a_is_rejected() {
    let err = Add::new(3u32, 6u32).unwrap().with_signed(true).unwrap_err();
    assert!(matches!(err, ConfigurationError::SignedNarrowOperand { .. }));
}

proptest! {
    #[test]
    fn add_matches_integer_sum(wa in 1u32..10, wb in 1u32..10, a: u64, b: u64) {
        let a = u128::from(a) % (1 << wa);
        let b = u128::from(b) % (1 << wb);
        let out = run(&Bloq::Add(Add::new(wa, wb).unwrap()), &[("a", a, wa), ("b", b, wb)]);
        prop_assert_eq!(read(&out, "a"), a);
        prop_assert_eq!(read(&out, "b"), (a + b) % (1 << wb));
    }
}
