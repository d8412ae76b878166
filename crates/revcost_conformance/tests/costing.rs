//! Call-graph aggregation: depth limits, full-expansion stability and generalizers.

use std::collections::BTreeMap;

use revcost_common::SymInt;
use revcost_conformance::{full_cost, sigma, total};
use revcost_decompose::callees;
use revcost_ir::{Add, AddK, Bloq, GF2Multiplication, GF2PartialProduct, OutOfPlaceAdder, ProductPart};
use revcost_resource::generalizer::{generalize_add_k_constant, ignore_alloc_free, ignore_bookkeeping, ignore_split_join};
use revcost_resource::{CallGraphOptions, Composed, KeepAll};

fn composites() -> Vec<Bloq> {
    vec![
        Bloq::Add(Add::symmetric(5u32).unwrap()),
        Bloq::Add(Add::new(6u32, 3u32).unwrap().with_signed(true).unwrap()),
        Bloq::OutOfPlaceAdder(OutOfPlaceAdder::new(4u32).unwrap()),
        Bloq::OutOfPlaceAdder(OutOfPlaceAdder::new(4u32).unwrap().with_carry_bit(false).adjoint()),
        Bloq::AddK(AddK::new(6u32, 37i64, false).unwrap()),
        Bloq::AddK(AddK::controlled(4u32, -2i64, true, vec![1, 0, 1]).unwrap()),
        Bloq::GF2Multiplication(GF2Multiplication::new(5u32, false).unwrap()),
        Bloq::GF2Multiplication(GF2Multiplication::new(3u32, true).unwrap()),
        Bloq::GF2PartialProduct(GF2PartialProduct::new(4u32, ProductPart::Lower).unwrap()),
    ]
}

#[test]
fn depth_one_sums_to_direct_callees() {
    for bloq in composites() {
        let direct: BTreeMap<Bloq, SymInt> = callees(&bloq).unwrap().counts.into_iter().collect();
        let leaves = sigma(&bloq, &KeepAll, CallGraphOptions::depth(1));
        assert_eq!(leaves, direct, "{bloq}");
        assert_eq!(total(&leaves), direct.values().sum::<SymInt>(), "{bloq}");
    }
}

#[test]
fn full_expansion_is_independent_of_sufficient_depth() {
    for bloq in composites() {
        let full = sigma(&bloq, &ignore_bookkeeping, CallGraphOptions::full());
        for depth in [8, 16, 64] {
            let bounded = sigma(&bloq, &ignore_bookkeeping, CallGraphOptions::depth(depth));
            assert_eq!(bounded, full, "{bloq} at depth {depth}");
        }
    }
}

#[test]
fn deeper_expansion_bottoms_out_in_elementary_gates() {
    for bloq in composites() {
        let full = sigma(&bloq, &ignore_bookkeeping, CallGraphOptions::full());
        assert!(full.keys().all(Bloq::is_elementary), "{bloq}");
    }
}

#[test]
fn ignoring_bookkeeping_never_adds_entries() {
    let ignores = [ignore_split_join, ignore_alloc_free, ignore_bookkeeping];
    for bloq in composites() {
        for depth in [1, 2, 3] {
            let options = CallGraphOptions::depth(depth);
            let kept = sigma(&bloq, &KeepAll, options);
            for ignore in ignores {
                let pruned = sigma(&bloq, &ignore, options);
                assert!(pruned.len() <= kept.len(), "{bloq} at depth {depth}");
                assert!(pruned.keys().all(|b| kept.contains_key(b)));
            }
        }
    }
}

#[test]
fn constant_generalizer_leaves_other_nodes_alone() {
    let root = Bloq::GF2Multiplication(GF2Multiplication::new(3u32, false).unwrap());
    let chain = Composed::new().then(ignore_bookkeeping).then(generalize_add_k_constant);
    let plain = sigma(&root, &ignore_bookkeeping, CallGraphOptions::full());
    assert_eq!(sigma(&root, &chain, CallGraphOptions::full()), plain);
}

#[test]
fn parallel_expansion_matches_serial() {
    for bloq in composites() {
        let serial = sigma(&bloq, &KeepAll, CallGraphOptions::full());
        let parallel = sigma(&bloq, &KeepAll, CallGraphOptions::full().with_parallel(true));
        assert_eq!(parallel, serial, "{bloq}");
    }
}

#[test]
fn add_k_gate_counts() {
    // Load and unload of 37 = 0b100101 cost 2 * 3 X gates around one 6-bit Add.
    let cost = full_cost(&Bloq::AddK(AddK::new(6u32, 37i64, false).unwrap()));
    assert_eq!(cost.counts.x, SymInt::lit(6));
    assert_eq!(cost.counts.and_bloq, SymInt::lit(5));
    assert_eq!(cost.counts.total_t_count(), SymInt::lit(20));
}
