use std::fs;
use std::io::Write;

use confdiff::config::SnapshotConfig;
use confdiff::snapshot::snapshot_from_str;
use confdiff::{
    plan_application, diff_lines, ConfdiffConfig, ConfdiffError, DiffExporter, Plan, PlanOptions,
    RolloutKind,
};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_key_order_does_not_produce_changes() {
    let config = SnapshotConfig::default();
    let before = snapshot_from_str(r#"{"b": 1, "a": {"y": null, "x": [3, 1]}}"#, &config).unwrap();
    let after = snapshot_from_str(r#"{"a": {"x": [3, 1]}, "b": 1}"#, &config).unwrap();

    assert_eq!(before, after);
    assert!(!diff_lines(&before, &after).has_changes());
}

#[test]
fn test_snapshot_diff_shows_changed_value() {
    let config = SnapshotConfig::default();
    let before = snapshot_from_str(r#"{"name": "api", "vcpu": 1}"#, &config).unwrap();
    let after = snapshot_from_str(r#"{"vcpu": 2, "name": "api"}"#, &config).unwrap();

    let rendered = diff_lines(&before, &after).render(1);

    assert_eq!(
        rendered,
        "...\n        \"name\": \"api\",\n-       \"vcpu\": 1\n+       \"vcpu\": 2\n      }\n..."
    );
}

#[test]
fn test_plan_lifecycle() {
    let options = PlanOptions::default();
    let desired = json!({
        "name": "worker",
        "max_instances": 2,
        "configuration": { "image": "docker.io/worker:1", "vcpu": 0.5 },
        "durable_objects": { "namespace_id": "abc" }
    });

    let created = plan_application(None, &desired, &options).unwrap();
    assert_eq!(created.describe(), "NEW worker");
    let Plan::Create { request, .. } = &created else {
        panic!("expected create plan");
    };

    // The control plane echoes the request back with its own bookkeeping
    let mut deployed = request.clone();
    deployed["id"] = json!("0191");
    deployed["instances"] = json!(2);

    let unchanged = plan_application(Some(&deployed), &desired, &options).unwrap();
    assert_eq!(unchanged.describe(), "no changes worker");
    assert!(!unchanged.should_apply());

    let mut bumped = desired.clone();
    bumped["configuration"]["image"] = json!("docker.io/worker:2");
    bumped["rollout_kind"] = json!("full_auto");
    let modified = plan_application(Some(&deployed), &bumped, &options).unwrap();
    assert_eq!(modified.describe(), "EDIT worker");
    assert!(modified.should_apply());
    let Plan::Modify { rollout, diff, .. } = &modified else {
        panic!("expected modify plan");
    };
    assert_eq!(rollout.kind, RolloutKind::FullAuto);
    assert_eq!(diff.stats().lines_added, 1);
    assert_eq!(diff.stats().lines_removed, 1);
}

#[test]
fn test_plan_rejects_namespace_move() {
    let deployed = json!({ "name": "worker", "durable_objects": { "namespace_id": "abc" } });
    let desired = json!({ "name": "worker", "durable_objects": { "namespace_id": "def" } });

    let err = plan_application(Some(&deployed), &desired, &PlanOptions::default()).unwrap_err();
    assert!(matches!(err, ConfdiffError::NamespaceMismatch { .. }));
}

#[test]
fn test_plan_options_follow_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("confdiff.toml");
    let mut file = fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        "[snapshot]\nwrapper_key = \"applications\"\n\n[diff]\nnewline_is_token = false"
    )
    .unwrap();

    let config = ConfdiffConfig::load_or_default(Some(config_path.as_path())).unwrap();
    let options = PlanOptions::from(&config);
    assert!(!options.diff.newline_is_token);

    let plan = plan_application(None, &json!({ "name": "w" }), &options).unwrap();
    assert!(plan.preview(3).starts_with("{\n  \"applications\": ["));
}

#[test]
fn test_export_plan_preview() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("plan.txt");

    let deployed = json!({ "name": "worker", "max_instances": 1 });
    let desired = json!({ "name": "worker", "max_instances": 3 });
    let plan = plan_application(Some(&deployed), &desired, &PlanOptions::default()).unwrap();

    DiffExporter::text().export_plan(&plan, &output).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("EDIT worker\nChanges: 1 insertion, 1 deletion\n"));
    assert!(content.contains("+       \"max_instances\": 3,"));
    assert!(content.contains("-       \"max_instances\": 1,"));
}
