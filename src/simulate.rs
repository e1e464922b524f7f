//! Dry-run an upgrade plan against an in-memory proxy.
//!
//! Plan modules are deployed as [`ManifestFacet`]s, the proxy is bootstrapped
//! with the standard management modules, and each step runs as its own
//! transaction. A failing step is recorded and the run continues from the
//! state the failure left behind, which is always the pre-step state.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use crate::codec::{encode_bare_call, encode_call};
use crate::config::{CutSpec, InitSpec, PlanConfig, StepKind, StepSpec};
use crate::diamond::{Diamond, StandardFacets};
use crate::engine::FacetCut;
use crate::events::EventRecord;
use crate::facet::manifest::ManifestFacet;
use crate::facet::registry::CodeRegistry;
use crate::loupe::FacetInfo;
use crate::types::{Address, Selector};

/// Outcome of one plan step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Position in the plan.
    pub index: usize,
    /// Label from the plan, if any.
    pub label: Option<String>,
    /// Whether the step committed.
    pub ok: bool,
    /// Failure reason.
    pub error: Option<String>,
    /// Decoded return data of `call` steps.
    pub output: Option<serde_json::Value>,
}

/// Result of a full simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Address of the simulated proxy.
    pub proxy: Address,
    /// Owner after the last step.
    pub owner: Address,
    /// Plan modules and where they were deployed.
    pub modules: BTreeMap<String, Address>,
    /// Standard modules.
    pub standard: BTreeMap<String, Address>,
    /// Per-step outcomes.
    pub steps: Vec<StepOutcome>,
    /// Routing after the last step.
    pub facets: Vec<FacetInfo>,
    /// Storage keys per namespace after the last step.
    pub storage: BTreeMap<String, Vec<String>>,
    /// Committed events.
    pub events: Vec<EventRecord>,
}

/// Run every step of `plan`.
///
/// # Errors
///
/// Returns an error only if the plan's modules cannot be deployed or the
/// proxy cannot be constructed; step failures are part of the report.
pub fn simulate(plan: &PlanConfig) -> anyhow::Result<SimulationReport> {
    let code = CodeRegistry::new();
    let standard = StandardFacets::deploy(&code);

    let mut modules = BTreeMap::new();
    for spec in &plan.modules {
        let facet = ManifestFacet::parse(spec.name.clone(), &spec.functions)
            .with_context(|| format!("module {:?}", spec.name))?;
        modules.insert(spec.name.clone(), code.deploy(Arc::new(facet)));
    }

    let mut args = standard.bootstrap_args(&code, plan.diamond.owner)?;
    if !plan.diamond.standard_init {
        args.init = None;
        args.init_calldata.clear();
    }
    let mut diamond = Diamond::new(Arc::clone(&code), args).context("failed to construct proxy")?;

    let mut steps = Vec::with_capacity(plan.steps.len());
    for (index, step) in plan.steps.iter().enumerate() {
        let outcome = match run_step(plan, &modules, &mut diamond, step) {
            Ok(output) => StepOutcome {
                index,
                label: step.label.clone(),
                ok: true,
                error: None,
                output,
            },
            Err(e) => {
                warn!(index, error = %e, "plan step failed");
                StepOutcome {
                    index,
                    label: step.label.clone(),
                    ok: false,
                    error: Some(format!("{e:#}")),
                    output: None,
                }
            }
        };
        steps.push(outcome);
    }

    let failed = steps.iter().filter(|s| !s.ok).count();
    info!(steps = steps.len(), failed, "plan simulated");

    Ok(SimulationReport {
        proxy: diamond.address(),
        owner: diamond.owner(),
        modules,
        standard: BTreeMap::from([
            ("DiamondCutFacet".to_owned(), standard.cut),
            ("DiamondLoupeFacet".to_owned(), standard.loupe),
            ("OwnershipFacet".to_owned(), standard.ownership),
            ("DiamondInit".to_owned(), standard.init),
        ]),
        steps,
        facets: diamond.facets(),
        storage: diamond
            .storage()
            .namespaces()
            .into_iter()
            .map(|ns| {
                let keys = diamond.storage().keys(&ns);
                (ns, keys)
            })
            .collect(),
        events: diamond.events().to_vec(),
    })
}

fn run_step(
    plan: &PlanConfig,
    modules: &BTreeMap<String, Address>,
    diamond: &mut Diamond,
    step: &StepSpec,
) -> anyhow::Result<Option<serde_json::Value>> {
    let caller = step.caller.unwrap_or_else(|| diamond.owner());
    match &step.kind {
        StepKind::Cut { cuts, init } => {
            let cuts = cuts
                .iter()
                .map(|cut| build_cut(plan, modules, cut))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let (target, calldata) = match init {
                Some(spec) => build_init(modules, spec)?,
                None => (None, Vec::new()),
            };
            diamond.diamond_cut(caller, &cuts, target, &calldata)?;
            Ok(None)
        }
        StepKind::TransferOwnership { new_owner } => {
            diamond.transfer_ownership(caller, *new_owner)?;
            Ok(None)
        }
        StepKind::Call { function, args } => {
            let selector = Selector::from_signature(function)?;
            let calldata = match args {
                Some(value) => encode_call(selector, value)?,
                None => encode_bare_call(selector),
            };
            let output = diamond.call(caller, &calldata)?;
            let decoded = serde_json::from_slice(&output)
                .unwrap_or_else(|_| serde_json::Value::String(hex::encode(&output)));
            Ok(Some(decoded))
        }
    }
}

fn build_cut(
    plan: &PlanConfig,
    modules: &BTreeMap<String, Address>,
    spec: &CutSpec,
) -> anyhow::Result<FacetCut> {
    let module = match &spec.module {
        Some(name) => *modules
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("module {name:?} was not deployed"))?,
        None => Address::ZERO,
    };
    let functions = match (&spec.functions, &spec.module) {
        (Some(functions), _) => functions.clone(),
        (None, Some(name)) => plan
            .module(name)
            .map(|m| m.functions.clone())
            .unwrap_or_default(),
        (None, None) => anyhow::bail!("{:?} cut without module must list functions", spec.action),
    };
    let selectors = functions
        .iter()
        .map(|f| Selector::from_signature(f))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FacetCut {
        module,
        action: spec.action,
        selectors,
    })
}

fn build_init(
    modules: &BTreeMap<String, Address>,
    spec: &InitSpec,
) -> anyhow::Result<(Option<Address>, Vec<u8>)> {
    let target = *modules
        .get(&spec.module)
        .ok_or_else(|| anyhow::anyhow!("init module {:?} was not deployed", spec.module))?;
    let selector = Selector::from_signature(&spec.function)?;
    Ok((Some(target), encode_bare_call(selector)))
}
