//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod adapter;
pub mod batch;
pub mod disks;
pub mod launch_spec;
pub mod node_ops;
pub mod poller;
pub mod post_launch;
pub mod worker_pool;
