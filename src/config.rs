// src/config.rs

//! Manages controller configuration: loading, defaulting, and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Failures that can occur while loading or validating a [`ClusterConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error(
        "availability zones are enabled but neither availability_zone_names nor \
         num_availability_zones was set"
    )]
    ZonesEnabledWithoutCount,

    #[error("initial_quorum_size must be -1 (meaning 'same as initial_size') or >= 0, got {0}")]
    InvalidQuorumSize(i64),

    #[error("zone_failure_threshold must be at least 1")]
    InvalidZoneFailureThreshold,
}

/// The predicate the controller's service-up enricher uses to decide whether the cluster, as
/// a whole, is "up" from the members' perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpQuorumCheck {
    /// Up if there are zero members, or at least one member is up. This is the default when
    /// `initial_size == 0` and nothing else was configured.
    AtLeastOneUnlessEmpty,
    /// Up only if every member reports `service_up = true`.
    AllUp,
    /// Up if at least `n` members report `service_up = true`.
    AtLeast(usize),
}

/// The fully resolved, validated controller configuration.
///
/// Field names match the configuration keys in the specification (`INITIAL_SIZE`,
/// `INITIAL_QUORUM_SIZE`, ...), translated to idiomatic `snake_case`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Target member count when `start()` is first called.
    #[serde(default = "default_initial_size")]
    pub initial_size: u32,

    /// Minimum live member count for `start()` to be considered successful.
    /// `-1` means "same as `initial_size`".
    #[serde(default = "default_initial_quorum_size")]
    pub initial_quorum_size: i64,

    #[serde(default)]
    pub up_quorum_check: Option<UpQuorumCheck>,

    /// Opaque identifier of the member blueprint to use for every member after the first.
    /// Resolving this identifier into an actual entity spec is a collaborator concern.
    #[serde(default)]
    pub member_spec: Option<String>,

    /// Opaque identifier of the member blueprint to use for the very first member, if it
    /// should differ from `member_spec`.
    #[serde(default)]
    pub first_member_spec: Option<String>,

    /// Name of the registered [`crate::core::removal::RemovalStrategy`] to use on shrink.
    #[serde(default = "default_removal_strategy")]
    pub removal_strategy: String,

    /// Name of the registered [`crate::core::zone::ZonePlacementStrategy`] to use.
    #[serde(default = "default_zone_placement_strategy")]
    pub zone_placement_strategy: String,

    /// Name of the registered [`crate::core::zone::ZoneFailureDetector`] to use.
    #[serde(default = "default_zone_failure_detector")]
    pub zone_failure_detector: String,

    #[serde(default)]
    pub enable_availability_zones: bool,

    #[serde(default)]
    pub availability_zone_names: Vec<String>,

    #[serde(default)]
    pub num_availability_zones: u32,

    #[serde(default = "default_quarantine_failed_entities")]
    pub quarantine_failed_entities: bool,

    /// Extra flags merged into every new member's flag map before `cluster_member_id` is
    /// overlaid on top.
    #[serde(default)]
    pub custom_child_flags: HashMap<String, String>,

    /// How often [`crate::core::health::HealthAggregator`] recomputes
    /// `cluster_one_and_all_members_up`.
    #[serde(with = "humantime_serde", default = "default_health_period")]
    pub health_aggregator_period: Duration,

    /// Consecutive start failures in a zone before the default
    /// [`crate::core::zone::ZoneFailureDetector`] classifies it as failed.
    #[serde(default = "default_zone_failure_threshold")]
    pub zone_failure_threshold: u32,
}

fn default_initial_size() -> u32 {
    1
}
fn default_initial_quorum_size() -> i64 {
    -1
}
fn default_removal_strategy() -> String {
    "newest_stoppable".to_string()
}
fn default_zone_placement_strategy() -> String {
    "round_robin".to_string()
}
fn default_zone_failure_detector() -> String {
    "consecutive_failures".to_string()
}
fn default_quarantine_failed_entities() -> bool {
    true
}
fn default_health_period() -> Duration {
    Duration::from_secs(5)
}
fn default_zone_failure_threshold() -> u32 {
    2
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            initial_size: default_initial_size(),
            initial_quorum_size: default_initial_quorum_size(),
            up_quorum_check: None,
            member_spec: None,
            first_member_spec: None,
            removal_strategy: default_removal_strategy(),
            zone_placement_strategy: default_zone_placement_strategy(),
            zone_failure_detector: default_zone_failure_detector(),
            enable_availability_zones: false,
            availability_zone_names: Vec::new(),
            num_availability_zones: 0,
            quarantine_failed_entities: default_quarantine_failed_entities(),
            custom_child_flags: HashMap::new(),
            health_aggregator_period: default_health_period(),
            zone_failure_threshold: default_zone_failure_threshold(),
        }
    }
}

impl ClusterConfig {
    /// Loads configuration layered as defaults → optional TOML file → environment overrides
    /// (prefixed `CLUSTERD_`), the same layering the teacher applies via the `config` crate.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&ClusterConfig::default()).unwrap());

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CLUSTERD")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder.build().map_err(|e| ConfigError::Read {
            path: path.unwrap_or("<defaults>").to_string(),
            reason: e.to_string(),
        })?;

        let cfg: ClusterConfig = built.try_deserialize().map_err(|e| ConfigError::Parse {
            path: path.unwrap_or("<defaults>").to_string(),
            reason: e.to_string(),
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates logical consistency eagerly at load time, mirroring the teacher's
    /// `Config::validate`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_quorum_size < -1 {
            return Err(ConfigError::InvalidQuorumSize(self.initial_quorum_size));
        }

        if self.enable_availability_zones
            && self.availability_zone_names.is_empty()
            && self.num_availability_zones == 0
        {
            return Err(ConfigError::ZonesEnabledWithoutCount);
        }

        if self.zone_failure_threshold == 0 {
            return Err(ConfigError::InvalidZoneFailureThreshold);
        }

        if self.initial_quorum_size >= 0 && self.initial_quorum_size as u64 > self.initial_size as u64 {
            warn!(
                initial_size = self.initial_size,
                initial_quorum_size = self.initial_quorum_size,
                "initial_quorum_size is greater than initial_size; start() will clamp the \
                 effective quorum down to initial_size"
            );
        }

        Ok(())
    }

    /// Resolves `initial_quorum_size` against `initial_size`, applying the "-1 means same as
    /// initial" rule and clamping an over-large quorum down with a warning.
    pub fn effective_quorum_size(&self) -> u32 {
        let requested = if self.initial_quorum_size < 0 {
            self.initial_size as i64
        } else {
            self.initial_quorum_size
        };

        if requested > self.initial_size as i64 {
            warn!(
                initial_size = self.initial_size,
                requested_quorum = requested,
                "clamping initial_quorum_size down to initial_size"
            );
            self.initial_size
        } else {
            requested as u32
        }
    }

    pub fn resolved_up_quorum_check(&self) -> UpQuorumCheck {
        self.up_quorum_check
            .unwrap_or(UpQuorumCheck::AtLeastOneUnlessEmpty)
    }
}
