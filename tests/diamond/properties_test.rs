//! Randomised cut batches checked against a plain map model.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use diamond::facet::manifest::ManifestFacet;
use diamond::{Address, CodeRegistry, CutAction, Diamond, DiamondArgs, DiamondError, FacetCut, Selector};
use proptest::prelude::*;

use crate::support::owner;

const MODULES: usize = 3;

fn universe(n: u8) -> Selector {
    Selector([n, 0, 0, 0])
}

fn setup() -> (Diamond, Vec<Address>) {
    let code = CodeRegistry::new();
    let modules = (0..MODULES)
        .map(|i| code.deploy(Arc::new(ManifestFacet::new(format!("M{i}"), Vec::new()))))
        .collect();
    let diamond = Diamond::new(
        code,
        DiamondArgs {
            owner: owner(),
            ..DiamondArgs::default()
        },
    )
    .expect("empty bootstrap");
    (diamond, modules)
}

/// Apply one batch to the model; `None` when the batch must fail.
fn model_apply(
    model: &BTreeMap<Selector, Address>,
    cuts: &[FacetCut],
) -> Option<BTreeMap<Selector, Address>> {
    if cuts.is_empty() {
        return None;
    }
    let mut next = model.clone();
    for cut in cuts {
        if cut.selectors.is_empty() {
            return None;
        }
        for selector in &cut.selectors {
            match cut.action {
                CutAction::Add => {
                    if next.insert(*selector, cut.module).is_some() {
                        return None;
                    }
                }
                CutAction::Replace => match next.get(selector) {
                    Some(current) if *current != cut.module => {
                        next.insert(*selector, cut.module);
                    }
                    _ => return None,
                },
                CutAction::Remove => {
                    next.remove(selector)?;
                }
            }
        }
    }
    Some(next)
}

fn arb_cut() -> impl Strategy<Value = (u8, usize, Vec<u8>)> {
    (0u8..3, 0..MODULES, prop::collection::vec(0u8..8, 0..4))
}

fn build_cut(modules: &[Address], (action, module, selectors): &(u8, usize, Vec<u8>)) -> FacetCut {
    let selectors = selectors.iter().map(|n| universe(*n)).collect();
    match action {
        0 => FacetCut::add(modules[*module], selectors),
        1 => FacetCut::replace(modules[*module], selectors),
        _ => FacetCut::remove(selectors),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn batches_match_model(
        batches in prop::collection::vec(prop::collection::vec(arb_cut(), 0..4), 1..8)
    ) {
        let (mut diamond, modules) = setup();
        let mut model: BTreeMap<Selector, Address> = BTreeMap::new();

        for batch in &batches {
            let cuts: Vec<FacetCut> = batch.iter().map(|c| build_cut(&modules, c)).collect();
            let before = diamond.state().clone();
            let expected = model_apply(&model, &cuts);
            let result = diamond.diamond_cut(owner(), &cuts, None, &[]);

            prop_assert_eq!(result.is_ok(), expected.is_some(), "cuts {:?}: {:?}", cuts, result);
            match expected {
                Some(next) => model = next,
                None => {
                    prop_assert_eq!(diamond.state(), &before);
                }
            }

            let table = diamond.state().table();
            prop_assert!(table.check_consistency().is_ok(), "{:?}", table.check_consistency());
            prop_assert_eq!(table.len(), model.len());
            for n in 0..8 {
                prop_assert_eq!(diamond.facet_address(universe(n)), model.get(&universe(n)).copied());
            }

            let listed: Vec<Selector> = diamond
                .facets()
                .into_iter()
                .flat_map(|info| info.selectors)
                .collect();
            let unique: BTreeSet<Selector> = listed.iter().copied().collect();
            prop_assert_eq!(listed.len(), unique.len());

            let routed: BTreeSet<Address> = model.values().copied().collect();
            let reported: BTreeSet<Address> = diamond.facet_addresses().into_iter().collect();
            prop_assert_eq!(reported, routed);
        }
    }

    #[test]
    fn non_owner_cuts_never_apply(
        batch in prop::collection::vec(arb_cut(), 1..4),
        caller in 1u8..=255,
    ) {
        let caller = Address::from_low_u8(caller);
        prop_assume!(caller != owner());
        let (mut diamond, modules) = setup();
        let cuts: Vec<FacetCut> = batch.iter().map(|c| build_cut(&modules, c)).collect();
        let before = diamond.state().clone();

        let err = diamond.diamond_cut(caller, &cuts, None, &[]).expect_err("non-owner");
        let unauthorized = matches!(err, DiamondError::Unauthorized { .. });
        prop_assert!(unauthorized);
        prop_assert_eq!(diamond.state(), &before);
    }
}
