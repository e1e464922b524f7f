//! Coverage for plan loading and validation.

use std::io::Write;

use diamond::config::{config_dir, load_plan, parse_plan, StepKind};
use diamond::{Address, CutAction};

const PLAN: &str = r#"
[diamond]
owner = "0x00000000000000000000000000000000000000aa"

[logging]
level = "debug"

[[modules]]
name = "Counter"
functions = ["increment()", "get()"]

[[steps]]
label = "install counter"
kind = "cut"
cuts = [{ action = "add", module = "Counter" }]

[[steps]]
kind = "call"
function = "increment()"

[[steps]]
kind = "transfer_ownership"
caller = "0x00000000000000000000000000000000000000bb"
new_owner = "0x00000000000000000000000000000000000000bb"
"#;

#[test]
fn parse_full_plan() {
    let plan = parse_plan(PLAN).expect("plan should parse");
    assert_eq!(plan.diamond.owner, Address::from_low_u8(0xaa));
    assert_eq!(plan.logging.level, "debug");
    assert_eq!(plan.modules.len(), 1);
    assert_eq!(plan.steps.len(), 3);

    assert_eq!(plan.steps[0].label.as_deref(), Some("install counter"));
    match &plan.steps[0].kind {
        StepKind::Cut { cuts, init } => {
            assert_eq!(cuts.len(), 1);
            assert_eq!(cuts[0].action, CutAction::Add);
            assert_eq!(cuts[0].module.as_deref(), Some("Counter"));
            assert!(cuts[0].functions.is_none());
            assert!(init.is_none());
        }
        other => panic!("expected cut step, got {other:?}"),
    }
    match &plan.steps[1].kind {
        StepKind::Call { function, args } => {
            assert_eq!(function, "increment()");
            assert!(args.is_none());
        }
        other => panic!("expected call step, got {other:?}"),
    }
    assert_eq!(plan.steps[2].caller, Some(Address::from_low_u8(0xbb)));
}

#[test]
fn load_plan_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(PLAN.as_bytes()).expect("write plan");
    let plan = load_plan(file.path()).expect("plan should load");
    assert_eq!(plan.modules[0].name, "Counter");
}

#[test]
fn load_plan_reports_missing_file() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let err = load_plan(&tmp.path().join("absent.toml")).expect_err("missing file");
    assert!(err.to_string().contains("failed to read plan"));
}

#[test]
fn rejects_malformed_owner() {
    assert!(parse_plan("[diamond]\nowner = \"0x1234\"\n").is_err());
}

#[test]
fn rejects_unknown_action() {
    let toml_str = r#"
[diamond]
owner = "0x00000000000000000000000000000000000000aa"

[[steps]]
kind = "cut"
cuts = [{ action = "upgrade", functions = ["a()"] }]
"#;
    assert!(parse_plan(toml_str).is_err());
}

#[test]
fn config_dir_resolves() {
    let path = config_dir().expect("config dir should resolve");
    assert!(path.ends_with(".diamond"));
}
