// src/core/errors.rs

//! Defines the primary error type for the controller.

use crate::config::ConfigError;
use std::sync::Arc;
use thiserror::Error;

/// All failures the controller's public API can return.
///
/// Using `thiserror` keeps each variant's display message next to its definition and gives
/// us automatic `From` impls for the collaborator/config error types we wrap.
#[derive(Error, Debug, Clone)]
pub enum ClusterError {
    #[error("cluster has no location configured and none was supplied to start()")]
    NoLocation,

    #[error("cluster already has a location and a different one was supplied to start()")]
    AmbiguousLocation,

    #[error("no member spec configured for the cluster")]
    NoMemberSpec,

    #[error("member {0} is not a current member of this cluster")]
    NoSuchMember(String),

    #[error("start completed with {current}/{quorum} members required for quorum")]
    QuorumNotReached {
        current: usize,
        quorum: usize,
        #[source]
        cause: Option<Arc<ClusterError>>,
    },

    #[error("grow step produced no member")]
    GrowFailed(#[source] Arc<ClusterError>),

    #[error(
        "replacement member {new_member} started but old member {old_member} failed to stop"
    )]
    StopFailed {
        new_member: String,
        old_member: String,
        #[source]
        cause: Arc<ClusterError>,
    },

    #[error("requested {requested} zones but only {available} sub-locations are available")]
    ZoneCapacityExhausted { requested: usize, available: usize },

    #[error("placement strategy '{strategy}' returned {got} entries, expected {expected}")]
    PlacementInvariant {
        strategy: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("operation '{0}' is not supported")]
    NotSupported(&'static str),

    #[error("management collaborator error: {0}")]
    Management(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
