//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the compute REST client,
//! the node record store, config and file access, and hook execution.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod fs;
pub mod gateway;
pub mod node_store;
pub mod registrar;
pub mod wire;
