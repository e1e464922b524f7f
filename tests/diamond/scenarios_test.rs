//! End-to-end scenarios: bootstrap, add, unauthorized add, replace, remove,
//! ownership edge cases.

use std::sync::Arc;

use diamond::codec::decode_return;
use diamond::facet::builtin::{DiamondCutFacet, DiamondLoupeFacet, OwnershipFacet};
use diamond::{Address, CodeRegistry, Diamond, DiamondArgs, DiamondError, Facet, FacetCut};

use crate::support::{call_bare, owner, sig, stranger, world, CounterFacet};

#[test]
fn scenario_a_bootstrap_lists_standard_modules_in_order() {
    let w = world();
    assert_eq!(
        w.diamond.facet_addresses(),
        vec![w.standard.cut, w.standard.loupe, w.standard.ownership]
    );

    let facets = w.diamond.facets();
    assert_eq!(facets.len(), 3);
    assert_eq!(facets[0].module, w.standard.cut);
    assert_eq!(facets[0].selectors, DiamondCutFacet.selectors());
    assert_eq!(facets[1].module, w.standard.loupe);
    assert_eq!(facets[1].selectors, DiamondLoupeFacet.selectors());
    assert_eq!(facets[2].module, w.standard.ownership);
    assert_eq!(facets[2].selectors, OwnershipFacet.selectors());
    assert_eq!(w.diamond.owner(), owner());
}

#[test]
fn scenario_b_owner_adds_function() {
    let mut w = world();
    let f1 = sig(CounterFacet::INCREMENT);
    w.diamond
        .diamond_cut(owner(), &[FacetCut::add(w.counter_v1, vec![f1])], None, &[])
        .expect("owner may add");

    assert_eq!(w.diamond.facet_address(f1), Some(w.counter_v1));
    let out = call_bare(&mut w.diamond, stranger(), CounterFacet::INCREMENT).expect("forwarded");
    assert_eq!(decode_return::<u64>(&out).expect("u64"), 1);
}

#[test]
fn scenario_c_non_owner_cannot_add() {
    let mut w = world();
    let before = w.diamond.state().clone();
    let f1 = sig(CounterFacet::INCREMENT);

    let err = w
        .diamond
        .diamond_cut(stranger(), &[FacetCut::add(w.counter_v1, vec![f1])], None, &[])
        .expect_err("stranger is not the owner");
    assert_eq!(
        err,
        DiamondError::Unauthorized {
            caller: stranger(),
            owner: owner()
        }
    );
    assert_eq!(w.diamond.state(), &before);
    assert_eq!(w.diamond.facet_address(f1), None);
}

#[test]
fn scenario_d_owner_replaces_function() {
    let mut w = world();
    let f1 = sig(CounterFacet::INCREMENT);
    w.diamond
        .diamond_cut(owner(), &[FacetCut::add(w.counter_v1, vec![f1])], None, &[])
        .expect("add");
    call_bare(&mut w.diamond, owner(), CounterFacet::INCREMENT).expect("v1 increments");

    w.diamond
        .diamond_cut(owner(), &[FacetCut::replace(w.counter_v2, vec![f1])], None, &[])
        .expect("replace");
    assert_eq!(w.diamond.facet_address(f1), Some(w.counter_v2));
    assert!(w.diamond.facet_function_selectors(w.counter_v1).is_empty());
    assert!(!w.diamond.facet_addresses().contains(&w.counter_v1));

    // v2 continues from the value v1 left in shared storage.
    let out = call_bare(&mut w.diamond, owner(), CounterFacet::INCREMENT).expect("v2 increments");
    assert_eq!(decode_return::<u64>(&out).expect("u64"), 11);
}

#[test]
fn scenario_e_owner_removes_function() {
    let mut w = world();
    let f1 = sig(CounterFacet::INCREMENT);
    w.diamond
        .diamond_cut(owner(), &[FacetCut::add(w.counter_v1, vec![f1])], None, &[])
        .expect("add");
    w.diamond
        .diamond_cut(owner(), &[FacetCut::remove(vec![f1])], None, &[])
        .expect("remove");

    assert_eq!(w.diamond.facet_address(f1), None);
    let err = call_bare(&mut w.diamond, owner(), CounterFacet::INCREMENT).expect_err("unrouted");
    assert_eq!(err, DiamondError::UnknownFunction(f1));
}

#[test]
fn scenario_f_self_transfer_is_rejected() {
    let mut w = world();
    let err = w
        .diamond
        .transfer_ownership(owner(), owner())
        .expect_err("self transfer");
    assert_eq!(err, DiamondError::NoOpTransfer(owner()));
    assert_eq!(w.diamond.owner(), owner());
}

#[test]
fn scenario_f_zero_owner_at_construction_is_rejected() {
    let code = CodeRegistry::new();
    let err = Diamond::new(
        Arc::clone(&code),
        DiamondArgs {
            owner: Address::ZERO,
            ..DiamondArgs::default()
        },
    )
    .expect_err("zero owner");
    assert_eq!(err, DiamondError::ZeroAddressOwner);
}

#[test]
fn empty_bootstrap_yields_empty_table() {
    let diamond = Diamond::new(
        CodeRegistry::new(),
        DiamondArgs {
            owner: owner(),
            ..DiamondArgs::default()
        },
    )
    .expect("empty proxy");
    assert!(diamond.facets().is_empty());
    assert!(diamond.events().is_empty());
}

#[test]
fn standard_init_registers_interfaces() {
    use diamond::facet::builtin::{
        diamond_cut_interface, diamond_loupe_interface, erc165_interface, ownership_interface,
    };
    use diamond::InterfaceId;

    let w = world();
    assert!(w.diamond.supports_interface(erc165_interface()));
    assert!(w.diamond.supports_interface(diamond_cut_interface()));
    assert!(w.diamond.supports_interface(diamond_loupe_interface()));
    assert!(w.diamond.supports_interface(ownership_interface()));
    assert!(!w.diamond.supports_interface(InterfaceId([0xff, 0xff, 0xff, 0xff])));
}
