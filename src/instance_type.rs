//! Named instance types and the resource limits behind them
//!
//! A container config sets its limits either with the individual `vcpu`,
//! `memory_mib` and `disk.size_mb` fields or with an `instance_type`. The
//! type is a preset name or an inline `{vcpu, memory_mib, disk_mb}` table.

use serde_json::{json, Map, Value};

/// Fields that express limits directly and are implied by a named type
const LIMIT_FIELDS: &[&str] = &["disk", "memory", "memory_mib", "vcpu"];

/// Type used when a configuration sets no limits at all
pub const DEFAULT_INSTANCE_TYPE: &str = "dev";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceLimits {
    pub vcpu: f64,
    pub memory_mib: u64,
    pub disk_mb: u64,
}

/// Preset names, each with the aliases that mean the same limits
const PRESETS: &[(&[&str], InstanceLimits)] = &[
    (
        &["lite", "dev"],
        InstanceLimits {
            vcpu: 0.0625,
            memory_mib: 256,
            disk_mb: 2000,
        },
    ),
    (
        &["basic"],
        InstanceLimits {
            vcpu: 0.25,
            memory_mib: 1024,
            disk_mb: 4000,
        },
    ),
    (
        &["standard"],
        InstanceLimits {
            vcpu: 0.5,
            memory_mib: 4096,
            disk_mb: 4000,
        },
    ),
];

impl InstanceLimits {
    /// Limits stated by a configuration, if all three are present
    pub fn from_configuration(configuration: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            vcpu: configuration.get("vcpu")?.as_f64()?,
            memory_mib: configuration.get("memory_mib")?.as_u64()?,
            disk_mb: configuration.get("disk")?.get("size_mb")?.as_u64()?,
        })
    }

    /// Limits of a preset name, aliases included
    pub fn for_name(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(names, _)| names.contains(&name))
            .map(|(_, limits)| *limits)
    }
}

/// Name of the preset whose limits match the configuration.
///
/// When `preferred` is an alias of the matching preset it is returned as
/// written, so a config that says `dev` is compared against `dev`.
pub fn infer_instance_type(
    configuration: &Map<String, Value>,
    preferred: Option<&str>,
) -> Option<String> {
    let limits = InstanceLimits::from_configuration(configuration)?;
    let (names, _) = PRESETS.iter().find(|(_, preset)| *preset == limits)?;

    let name = match preferred {
        Some(preferred) if names.contains(&preferred) => preferred,
        _ => names[0],
    };
    Some(name.to_string())
}

/// Expand the desired config's `instance_type` into configuration fields.
///
/// A top-level `instance_type` moves into `configuration`. A preset name is
/// kept as is. An inline table becomes `vcpu`, `memory_mib` and
/// `disk.size_mb`. A configuration left without any limit gets the default
/// type.
pub fn apply_instance_type(request: &mut Map<String, Value>) {
    if let Some(instance_type) = request.remove("instance_type") {
        let configuration = request
            .entry("configuration")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(configuration) = configuration {
            configuration.insert("instance_type".to_string(), instance_type);
        }
    }
    let Some(Value::Object(configuration)) = request.get_mut("configuration") else {
        return;
    };

    if let Some(Value::Object(custom)) = configuration.get("instance_type").cloned() {
        configuration.remove("instance_type");
        for field in ["vcpu", "memory_mib"] {
            if let Some(value) = custom.get(field) {
                configuration.insert(field.to_string(), value.clone());
            }
        }
        if let Some(disk_mb) = custom.get("disk_mb") {
            configuration.insert("disk".to_string(), json!({ "size_mb": disk_mb }));
        }
    }

    let has_limits = configuration.contains_key("instance_type")
        || configuration.contains_key("vcpu")
        || configuration.contains_key("memory_mib")
        || configuration
            .get("disk")
            .and_then(|disk| disk.get("size_mb"))
            .is_some();
    if !has_limits {
        configuration.insert(
            "instance_type".to_string(),
            Value::String(DEFAULT_INSTANCE_TYPE.to_string()),
        );
    }
}

/// Replace the limit fields of a deployed configuration with the preset name
/// they correspond to. Configurations that match no preset are left alone.
pub fn clean_for_instance_type(
    configuration: &mut Map<String, Value>,
    desired: Option<&str>,
) -> bool {
    let Some(instance_type) = infer_instance_type(configuration, desired) else {
        return false;
    };

    for field in LIMIT_FIELDS {
        configuration.remove(*field);
    }
    configuration.insert("instance_type".to_string(), Value::String(instance_type));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_infer_instance_type() {
        let configuration = object(json!({
            "vcpu": 0.0625,
            "memory_mib": 256,
            "disk": { "size_mb": 2000, "size": "2GB" }
        }));

        assert_eq!(infer_instance_type(&configuration, None).as_deref(), Some("lite"));
        assert_eq!(infer_instance_type(&configuration, Some("dev")).as_deref(), Some("dev"));
        assert_eq!(infer_instance_type(&configuration, Some("basic")).as_deref(), Some("lite"));

        let custom = object(json!({
            "vcpu": 1,
            "memory_mib": 1000,
            "disk": { "size_mb": 2000 }
        }));
        assert_eq!(infer_instance_type(&custom, None), None);

        let partial = object(json!({ "vcpu": 0.25, "memory_mib": 1024 }));
        assert_eq!(infer_instance_type(&partial, None), None);
    }

    #[test]
    fn test_limits_for_name() {
        assert_eq!(InstanceLimits::for_name("dev"), InstanceLimits::for_name("lite"));
        assert_eq!(InstanceLimits::for_name("basic").map(|l| l.memory_mib), Some(1024));
        assert_eq!(InstanceLimits::for_name("huge"), None);
    }

    #[test]
    fn test_apply_named_instance_type() {
        let mut request = object(json!({
            "instance_type": "basic",
            "configuration": { "image": "app:1" }
        }));
        apply_instance_type(&mut request);

        assert!(request.get("instance_type").is_none());
        assert_eq!(
            Value::Object(request)["configuration"],
            json!({ "image": "app:1", "instance_type": "basic" })
        );
    }

    #[test]
    fn test_apply_top_level_type_without_configuration() {
        let mut request = object(json!({ "name": "web", "instance_type": "standard" }));
        apply_instance_type(&mut request);
        assert_eq!(
            Value::Object(request),
            json!({ "name": "web", "configuration": { "instance_type": "standard" } })
        );
    }

    #[test]
    fn test_apply_custom_instance_type() {
        let mut request = object(json!({
            "configuration": {
                "image": "app:1",
                "instance_type": { "vcpu": 1, "memory_mib": 1000, "disk_mb": 2000 }
            }
        }));
        apply_instance_type(&mut request);

        assert_eq!(
            Value::Object(request)["configuration"],
            json!({
                "image": "app:1",
                "vcpu": 1,
                "memory_mib": 1000,
                "disk": { "size_mb": 2000 }
            })
        );
    }

    #[test]
    fn test_apply_defaults_without_limits() {
        let mut request = object(json!({ "configuration": { "image": "app:1" } }));
        apply_instance_type(&mut request);
        assert_eq!(
            Value::Object(request)["configuration"]["instance_type"],
            json!(DEFAULT_INSTANCE_TYPE)
        );

        let mut explicit = object(json!({ "configuration": { "image": "app:1", "vcpu": 2 } }));
        apply_instance_type(&mut explicit);
        assert!(explicit["configuration"].get("instance_type").is_none());

        let mut bare = object(json!({ "name": "web" }));
        apply_instance_type(&mut bare);
        assert_eq!(Value::Object(bare), json!({ "name": "web" }));
    }

    #[test]
    fn test_clean_for_instance_type() {
        let mut configuration = object(json!({
            "image": "app:1",
            "vcpu": 0.25,
            "memory": "1GB",
            "memory_mib": 1024,
            "disk": { "size": "4GB", "size_mb": 4000 }
        }));

        assert!(clean_for_instance_type(&mut configuration, Some("basic")));
        assert_eq!(
            Value::Object(configuration),
            json!({ "image": "app:1", "instance_type": "basic" })
        );

        let mut custom = object(json!({ "vcpu": 3, "memory_mib": 1, "disk": { "size_mb": 1 } }));
        let untouched = custom.clone();
        assert!(!clean_for_instance_type(&mut custom, Some("dev")));
        assert_eq!(custom, untouched);
    }
}
