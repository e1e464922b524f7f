//! Dynamic-path dispatch, including the management surface routed through
//! the standard modules.

use diamond::codec::{decode_return, encode_bare_call, encode_call};
use diamond::engine::RawFacetCut;
use diamond::facet::builtin::{
    erc165_interface, DiamondCutArgs, DIAMOND_CUT_SIG, FACETS_SIG, FACET_ADDRESSES_SIG,
    FACET_ADDRESS_SIG, FACET_FUNCTION_SELECTORS_SIG, OWNER_SIG, SUPPORTS_INTERFACE_SIG,
};
use diamond::loupe::FacetInfo;
use diamond::{Address, DiamondError, FacetCut, Selector};

use crate::support::{call_bare, owner, sig, stranger, world, CounterFacet};

#[test]
fn unknown_selector_fails_without_touching_state() {
    let mut w = world();
    let before = w.diamond.state().clone();
    let events = w.diamond.events().len();

    let err = call_bare(&mut w.diamond, owner(), "missing()").expect_err("unrouted");
    assert_eq!(err, DiamondError::UnknownFunction(sig("missing()")));
    assert_eq!(w.diamond.state(), &before);
    assert_eq!(w.diamond.events().len(), events);
}

#[test]
fn short_calldata_resolves_to_padded_selector() {
    let mut w = world();
    let err = w.diamond.call(owner(), &[0x01, 0x02]).expect_err("unrouted");
    assert_eq!(err, DiamondError::UnknownFunction(Selector([0x01, 0x02, 0, 0])));
}

#[test]
fn module_revert_message_propagates_verbatim() {
    let mut w = world();
    w.diamond
        .diamond_cut(
            owner(),
            &[FacetCut::add(
                w.counter_v1,
                vec![sig(CounterFacet::FAIL), sig(CounterFacet::FAIL_SILENTLY)],
            )],
            None,
            &[],
        )
        .expect("add");

    let err = call_bare(&mut w.diamond, owner(), CounterFacet::FAIL).expect_err("reverts");
    assert_eq!(err.to_string(), "counter: deliberate failure");

    let err = call_bare(&mut w.diamond, owner(), CounterFacet::FAIL_SILENTLY).expect_err("reverts");
    assert_eq!(err, DiamondError::Reverted(None));
    assert_eq!(err.to_string(), "low-level call failed");
}

#[test]
fn arguments_reach_the_module() {
    let mut w = world();
    w.diamond
        .diamond_cut(
            owner(),
            &[FacetCut::add(
                w.counter_v1,
                vec![sig(CounterFacet::SET), sig(CounterFacet::GET)],
            )],
            None,
            &[],
        )
        .expect("add");

    let data = encode_call(sig(CounterFacet::SET), &41u64).expect("encode");
    w.diamond.call(stranger(), &data).expect("set");
    let out = call_bare(&mut w.diamond, stranger(), CounterFacet::GET).expect("get");
    assert_eq!(decode_return::<u64>(&out).expect("u64"), 41);
}

#[test]
fn loupe_is_reachable_through_the_table() {
    let mut w = world();

    let out = call_bare(&mut w.diamond, stranger(), FACET_ADDRESSES_SIG).expect("facetAddresses");
    assert_eq!(decode_return::<Vec<Address>>(&out).expect("addresses"), w.diamond.facet_addresses());

    let out = call_bare(&mut w.diamond, stranger(), FACETS_SIG).expect("facets");
    assert_eq!(decode_return::<Vec<FacetInfo>>(&out).expect("facets"), w.diamond.facets());

    let data = encode_call(sig(FACET_FUNCTION_SELECTORS_SIG), &w.standard.ownership).expect("encode");
    let out = w.diamond.call(stranger(), &data).expect("facetFunctionSelectors");
    assert_eq!(
        decode_return::<Vec<Selector>>(&out).expect("selectors"),
        w.diamond.facet_function_selectors(w.standard.ownership)
    );

    let data = encode_call(sig(FACET_ADDRESS_SIG), &sig(OWNER_SIG)).expect("encode");
    let out = w.diamond.call(stranger(), &data).expect("facetAddress");
    assert_eq!(decode_return::<Option<Address>>(&out).expect("address"), Some(w.standard.ownership));

    let data = encode_call(sig(FACET_ADDRESS_SIG), &sig("missing()")).expect("encode");
    let out = w.diamond.call(stranger(), &data).expect("facetAddress");
    assert_eq!(decode_return::<Option<Address>>(&out).expect("address"), None);

    let data = encode_call(sig(SUPPORTS_INTERFACE_SIG), &erc165_interface()).expect("encode");
    let out = w.diamond.call(stranger(), &data).expect("supportsInterface");
    assert!(decode_return::<bool>(&out).expect("bool"));
}

#[test]
fn introspection_is_idempotent() {
    let w = world();
    assert_eq!(w.diamond.facets(), w.diamond.facets());
    assert_eq!(w.diamond.facet_addresses(), w.diamond.facet_addresses());
    assert_eq!(
        w.diamond.facet_function_selectors(w.standard.loupe),
        w.diamond.facet_function_selectors(w.standard.loupe)
    );
    assert!(w.diamond.facet_function_selectors(Address::from_low_u8(0x77)).is_empty());
}

#[test]
fn cut_through_the_table_is_owner_gated() {
    let mut w = world();
    let f1 = sig(CounterFacet::INCREMENT);
    let args = DiamondCutArgs::new(&[FacetCut::add(w.counter_v1, vec![f1])], None, &[]);
    let data = encode_call(sig(DIAMOND_CUT_SIG), &args).expect("encode");

    let err = w.diamond.call(stranger(), &data).expect_err("stranger");
    assert!(matches!(err, DiamondError::Unauthorized { .. }));
    assert_eq!(w.diamond.facet_address(f1), None);

    w.diamond.call(owner(), &data).expect("owner");
    assert_eq!(w.diamond.facet_address(f1), Some(w.counter_v1));
}

#[test]
fn unknown_action_code_is_rejected() {
    let mut w = world();
    let args = DiamondCutArgs {
        cuts: vec![RawFacetCut {
            module: w.counter_v1,
            action: 7,
            selectors: vec![sig(CounterFacet::GET)],
        }],
        init: Address::ZERO,
        calldata: String::new(),
    };
    let data = encode_call(sig(DIAMOND_CUT_SIG), &args).expect("encode");
    let err = w.diamond.call(owner(), &data).expect_err("bad action");
    assert_eq!(err, DiamondError::UnknownAction(7));
}

#[test]
fn removing_routed_cut_selector_keeps_static_cut_available() {
    let mut w = world();
    let cut_selector = sig(DIAMOND_CUT_SIG);
    w.diamond
        .diamond_cut(owner(), &[FacetCut::remove(vec![cut_selector])], None, &[])
        .expect("remove diamondCut from the table");
    assert!(!w.diamond.facet_addresses().contains(&w.standard.cut));

    let err = call_bare(&mut w.diamond, owner(), DIAMOND_CUT_SIG).expect_err("unrouted");
    assert_eq!(err, DiamondError::UnknownFunction(cut_selector));

    // The typed entry point does not depend on the table.
    w.diamond
        .diamond_cut(owner(), &[FacetCut::add(w.standard.cut, vec![cut_selector])], None, &[])
        .expect("restore");
    assert_eq!(w.diamond.facet_address(cut_selector), Some(w.standard.cut));
}

#[test]
fn owner_is_readable_through_the_table() {
    let mut w = world();
    let out = w
        .diamond
        .call(stranger(), &encode_bare_call(sig(OWNER_SIG)))
        .expect("owner()");
    assert_eq!(decode_return::<Address>(&out).expect("address"), owner());
}

#[test]
fn modules_deployed_after_construction_can_be_routed() {
    let mut w = world();
    let late = w.code.deploy(std::sync::Arc::new(
        diamond::facet::manifest::ManifestFacet::parse("Late", &["late()"]).expect("signature"),
    ));
    w.diamond
        .diamond_cut(owner(), &[FacetCut::add(late, vec![sig("late()")])], None, &[])
        .expect("add late module");

    let out = call_bare(&mut w.diamond, stranger(), "late()").expect("late()");
    let reply: diamond::facet::manifest::ManifestReply = decode_return(&out).expect("reply");
    assert_eq!(reply.module, "Late");
    assert_eq!(reply.function, "late()");
    assert_eq!(reply.calls, 1);
}
