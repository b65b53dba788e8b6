//! The compute instance a budget breach stops.
//!
//! [`TargetConfig`] is the raw, possibly incomplete configuration as read
//! from the environment. [`ResourceTarget`] is the validated form; only a
//! `ResourceTarget` can be handed to the control plane.

use std::fmt;

use crate::error::CoreError;

pub const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub const ENV_ZONE: &str = "ZONE";
pub const ENV_INSTANCE_NAME: &str = "INSTANCE_NAME";

/// Longest accepted project, zone or instance identifier.
const MAX_SEGMENT_LEN: usize = 128;

/// Target identity as configured. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetConfig {
    pub project_id: Option<String>,
    pub zone: Option<String>,
    pub instance_name: Option<String>,
}

/// A complete, validated instance identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTarget {
    project_id: String,
    zone: String,
    instance_name: String,
}

impl TargetConfig {
    /// Read the target from `PROJECT_ID`, `ZONE` and `INSTANCE_NAME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            project_id: read(ENV_PROJECT_ID),
            zone: read(ENV_ZONE),
            instance_name: read(ENV_INSTANCE_NAME),
        }
    }

    /// Names of the environment variables that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (ENV_PROJECT_ID, &self.project_id),
            (ENV_ZONE, &self.zone),
            (ENV_INSTANCE_NAME, &self.instance_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Validate into a [`ResourceTarget`].
    pub fn resolve(&self) -> Result<ResourceTarget, CoreError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(CoreError::MissingTarget(missing));
        }

        // All three are present after the check above.
        let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        ResourceTarget::new(
            field(&self.project_id),
            field(&self.zone),
            field(&self.instance_name),
        )
    }
}

impl ResourceTarget {
    /// Construct a target, rejecting identifiers that could not be a
    /// single URL path segment.
    pub fn new(
        project_id: impl Into<String>,
        zone: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let target = Self {
            project_id: project_id.into(),
            zone: zone.into(),
            instance_name: instance_name.into(),
        };

        for (name, value) in [
            (ENV_PROJECT_ID, &target.project_id),
            (ENV_ZONE, &target.zone),
            (ENV_INSTANCE_NAME, &target.instance_name),
        ] {
            if !is_safe_segment(value) {
                return Err(CoreError::Validation(format!(
                    "{name} '{value}' is not a valid resource identifier"
                )));
            }
        }

        Ok(target)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/zones/{}/instances/{}",
            self.project_id, self.zone, self.instance_name
        )
    }
}

/// Allowed characters: alphanumeric, hyphen, underscore, dot, colon
/// (domain-scoped project IDs use `example.com:project`).
fn is_safe_segment(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SEGMENT_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
