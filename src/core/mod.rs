// src/core/mod.rs

//! The central module containing the cluster controller's core logic and data structures.

pub mod controller;
pub mod entity;
pub mod errors;
pub mod events;
pub mod health;
pub mod id_allocator;
pub mod member;
pub mod metrics;
pub mod node_factory;
pub mod parallel_starter;
pub mod quarantine;
pub mod removal;
pub mod state;
pub mod tasks;
pub mod zone;

pub use controller::Controller;
pub use errors::ClusterError;
pub use member::{Member, MemberId};
