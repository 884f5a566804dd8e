//! Deploy planning
//!
//! Compares the application that is currently deployed with the one described
//! by local configuration and decides whether it has to be created, modified
//! or left alone. The comparison runs on normalised JSON snapshots so the
//! preview shown to the user is a plain line diff.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ConfdiffConfig, SnapshotConfig};
use crate::diff::{Diff, DiffAlgorithm, DiffOptions, MyersAlgorithm};
use crate::error::{ConfdiffError, Result};
use crate::instance_type::{apply_instance_type, clean_for_instance_type};
use crate::snapshot::{merge_deep, normalize, sort_keys_recursive, to_snapshot};

/// Fields of a deployed application that take part in the comparison.
/// Server-side bookkeeping such as ids and timestamps is ignored.
const COMPARED_FIELDS: &[&str] = &[
    "name",
    "configuration",
    "constraints",
    "max_instances",
    "scheduling_policy",
    "affinities",
    "instances",
    "jobs",
    "durable_objects",
];

/// Fields sent when an existing application is modified
const MODIFY_FIELDS: &[&str] = &[
    "configuration",
    "instances",
    "max_instances",
    "constraints",
    "affinities",
    "scheduling_policy",
];

/// How a modification is rolled out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutKind {
    #[default]
    FullAuto,
    FullManual,
    None,
}

impl RolloutKind {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "full_auto" => Ok(Self::FullAuto),
            "full_manual" => Ok(Self::FullManual),
            "none" => Ok(Self::None),
            other => Err(ConfdiffError::InvalidConfig(format!(
                "unknown rollout_kind \"{other}\", expected full_auto, full_manual or none"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rollout {
    pub kind: RolloutKind,
    pub step_percentage: Option<u32>,
}

impl Rollout {
    /// Read `rollout_kind` and `rollout_step_percentage` from a desired config
    fn from_desired(desired: &Map<String, Value>) -> Result<Self> {
        let kind = match desired.get("rollout_kind") {
            None | Some(Value::Null) => RolloutKind::default(),
            Some(Value::String(kind)) => RolloutKind::parse(kind)?,
            Some(other) => {
                return Err(ConfdiffError::InvalidConfig(format!(
                    "rollout_kind must be a string, got {other}"
                )))
            }
        };

        let step_percentage = match desired.get("rollout_step_percentage") {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_u64() {
                Some(step @ 1..=100) => Some(step as u32),
                _ => {
                    return Err(ConfdiffError::InvalidConfig(format!(
                        "rollout_step_percentage must be between 1 and 100, got {value}"
                    )))
                }
            },
        };

        Ok(Self {
            kind,
            step_percentage,
        })
    }
}

/// Outcome of comparing a deployed application with its desired state
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Nothing is deployed under this name yet
    Create {
        name: String,
        snapshot: String,
        request: Value,
    },
    /// Deployed and desired snapshots are identical
    NoChange { name: String },
    /// The deployed application differs from the desired one
    Modify {
        name: String,
        diff: Diff,
        request: Value,
        rollout: Rollout,
    },
}

impl Plan {
    pub fn name(&self) -> &str {
        match self {
            Plan::Create { name, .. } | Plan::NoChange { name } | Plan::Modify { name, .. } => name,
        }
    }

    /// Status line printed before the preview
    pub fn describe(&self) -> String {
        match self {
            Plan::Create { name, .. } => format!("NEW {name}"),
            Plan::NoChange { name } => format!("no changes {name}"),
            Plan::Modify { name, .. } => format!("EDIT {name}"),
        }
    }

    /// Whether anything should be sent to the control plane
    pub fn should_apply(&self) -> bool {
        match self {
            Plan::Create { .. } => true,
            Plan::NoChange { .. } => false,
            Plan::Modify { rollout, .. } => rollout.kind != RolloutKind::None,
        }
    }

    /// Whether the deployed application differs from the desired one,
    /// regardless of how the change would be rolled out
    pub fn has_changes(&self) -> bool {
        !matches!(self, Plan::NoChange { .. })
    }

    pub fn diff(&self) -> Option<&Diff> {
        match self {
            Plan::Modify { diff, .. } => Some(diff),
            _ => None,
        }
    }

    /// Preview body: the new snapshot for a creation, the rendered diff for a
    /// modification and nothing otherwise.
    pub fn preview(&self, context_lines: usize) -> String {
        match self {
            Plan::Create { snapshot, .. } => snapshot.clone(),
            Plan::NoChange { .. } => String::new(),
            Plan::Modify { diff, .. } => diff.render(context_lines),
        }
    }
}

/// Settings used while planning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOptions {
    pub snapshot: SnapshotConfig,
    pub diff: DiffOptions,
}

impl From<&ConfdiffConfig> for PlanOptions {
    fn from(config: &ConfdiffConfig) -> Self {
        Self {
            snapshot: config.snapshot.clone(),
            diff: config.diff.diff_options(),
        }
    }
}

/// Compare the deployed application (if any) with the desired one
pub fn plan_application(
    previous: Option<&Value>,
    desired: &Value,
    options: &PlanOptions,
) -> Result<Plan> {
    let desired = desired.as_object().ok_or_else(|| {
        ConfdiffError::InvalidConfig("desired application must be a JSON object".to_string())
    })?;
    let previous = previous
        .map(|previous| {
            previous.as_object().ok_or_else(|| {
                ConfdiffError::InvalidConfig(
                    "previous application must be a JSON object".to_string(),
                )
            })
        })
        .transpose()?;

    let name = application_name(desired, previous)?;
    let rollout = Rollout::from_desired(desired)?;
    let request = desired_to_request(desired, previous);

    let Some(previous) = previous else {
        let snapshot = to_snapshot(
            &normalize(request.clone(), &options.snapshot),
            &options.snapshot.wrapper_key,
        )?;
        tracing::info!("NEW {}", name);
        return Ok(Plan::Create {
            name,
            snapshot,
            request,
        });
    };

    check_namespace(&name, previous, desired)?;

    let mut previous = previous_to_request(previous);
    if let Some(instance_type) = request
        .get("configuration")
        .and_then(|configuration| configuration.get("instance_type"))
        .and_then(Value::as_str)
    {
        let configuration = previous
            .get_mut("configuration")
            .and_then(Value::as_object_mut);
        if let Some(configuration) = configuration {
            if clean_for_instance_type(configuration, Some(instance_type)) {
                tracing::debug!("Comparing {} by instance type {}", name, instance_type);
            }
        }
    }
    let previous = normalize(previous, &options.snapshot);
    let merged = merge_deep(previous.clone(), sort_keys_recursive(request.clone()));
    let merged = normalize(merged, &options.snapshot);

    let before = to_snapshot(&previous, &options.snapshot.wrapper_key)?;
    let after = to_snapshot(&merged, &options.snapshot.wrapper_key)?;
    let diff = MyersAlgorithm::new(options.diff).diff(&before, &after);

    if !diff.has_changes() {
        tracing::info!("no changes {}", name);
        return Ok(Plan::NoChange { name });
    }

    tracing::info!("EDIT {} ({} changed segments)", name, diff.changes());
    if rollout.kind == RolloutKind::None {
        tracing::warn!("rollout_kind is none, changes to {} will not be applied", name);
    }

    Ok(Plan::Modify {
        name,
        diff,
        request: modify_request(&request),
        rollout,
    })
}

fn application_name(
    desired: &Map<String, Value>,
    previous: Option<&Map<String, Value>>,
) -> Result<String> {
    desired
        .get("name")
        .or_else(|| previous.and_then(|previous| previous.get("name")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfdiffError::InvalidConfig("application name is required".to_string()))
}

fn namespace_id(application: &Map<String, Value>) -> Option<&str> {
    application
        .get("durable_objects")
        .and_then(|objects| objects.get("namespace_id"))
        .and_then(Value::as_str)
}

fn check_namespace(
    name: &str,
    previous: &Map<String, Value>,
    desired: &Map<String, Value>,
) -> Result<()> {
    let Some(desired_namespace) = namespace_id(desired) else {
        return Ok(());
    };

    match namespace_id(previous) {
        None => Err(ConfdiffError::MissingNamespace(name.to_string())),
        Some(previous_namespace) if previous_namespace != desired_namespace => {
            Err(ConfdiffError::NamespaceMismatch {
                application: name.to_string(),
                previous: previous_namespace.to_string(),
                desired: desired_namespace.to_string(),
            })
        }
        Some(_) => Ok(()),
    }
}

/// Reduce a deployed application to the fields a create request carries
fn previous_to_request(previous: &Map<String, Value>) -> Value {
    let mut request: Map<String, Value> = COMPARED_FIELDS
        .iter()
        .filter_map(|field| previous.get(*field).map(|value| (field.to_string(), value.clone())))
        .collect();

    if request.contains_key("max_instances") {
        request.insert("instances".to_string(), Value::from(0));
    }
    if let Some(jobs) = request.get_mut("jobs") {
        *jobs = if is_truthy(jobs) {
            Value::Bool(true)
        } else {
            Value::Null
        };
    }
    if let Some(observability) = request
        .get_mut("configuration")
        .and_then(|configuration| configuration.get_mut("observability"))
        .and_then(Value::as_object_mut)
    {
        cleanup_observability(observability);
    }

    Value::Object(request)
}

/// Turn a desired config into a create request.
///
/// Rollout settings are dropped, `instance_type` is expanded into the
/// configuration, a top-level `observability` block becomes
/// `configuration.observability` and constraint locations get their
/// canonical casing.
fn desired_to_request(
    desired: &Map<String, Value>,
    previous: Option<&Map<String, Value>>,
) -> Value {
    let mut request = desired.clone();
    request.remove("rollout_kind");
    request.remove("rollout_step_percentage");
    apply_instance_type(&mut request);

    let intent = request.remove("observability");
    let existing = previous
        .and_then(|previous| previous.get("configuration"))
        .and_then(|configuration| configuration.get("observability"));
    if let Some(observability) = resolve_observability(intent.as_ref(), existing) {
        let configuration = request
            .entry("configuration")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(configuration) = configuration {
            configuration.insert("observability".to_string(), observability);
        }
    }

    if let Some(Value::Object(constraints)) = request.get_mut("constraints") {
        recase_locations(constraints, "cities", str::to_lowercase);
        recase_locations(constraints, "regions", str::to_uppercase);
    }

    Value::Object(request)
}

fn recase_locations(constraints: &mut Map<String, Value>, key: &str, recase: fn(&str) -> String) {
    if let Some(Value::Array(locations)) = constraints.get_mut(key) {
        for location in locations.iter_mut() {
            if let Value::String(text) = location {
                *text = recase(text);
            }
        }
    }
}

fn modify_request(request: &Value) -> Value {
    let mut body: Map<String, Value> = MODIFY_FIELDS
        .iter()
        .filter_map(|field| request.get(*field).map(|value| (field.to_string(), value.clone())))
        .collect();
    if body.contains_key("max_instances") {
        body.insert("instances".to_string(), Value::from(0));
    }
    Value::Object(body)
}

/// Drop the deprecated `logging` block when `logs` is present as well
pub fn cleanup_observability(observability: &mut Map<String, Value>) {
    if observability.contains_key("logging") && observability.contains_key("logs") {
        observability.remove("logging");
    }
}

/// Decide the `configuration.observability` value to send.
///
/// Logs are enabled when the local config asks for them, either directly or
/// through the top-level `enabled` switch. Otherwise an application that
/// already reports a logs setting gets it turned off and one that never had
/// it is left without the block.
pub fn resolve_observability(intent: Option<&Value>, existing: Option<&Value>) -> Option<Value> {
    let logs_flag = intent
        .and_then(|intent| intent.get("logs"))
        .and_then(|logs| logs.get("enabled"))
        .and_then(Value::as_bool);
    let enabled = intent
        .and_then(|intent| intent.get("enabled"))
        .and_then(Value::as_bool);

    let logs_enabled =
        logs_flag == Some(true) || (enabled == Some(true) && logs_flag != Some(false));
    if logs_enabled {
        return Some(serde_json::json!({ "logs": { "enabled": true } }));
    }

    let already_set = existing
        .and_then(|existing| existing.get("logs"))
        .and_then(|logs| logs.get("enabled"))
        .and_then(Value::as_bool)
        .is_some();
    already_set.then(|| serde_json::json!({ "logs": { "enabled": false } }))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
