//! Deploy-manager daemon library
//!
//! This module provides the HTTP side of the OCM deployment manager:
//! - REST API handlers under `/deploy-manager`
//! - The job manager client
//! - Layered configuration
//! - Server lifecycle management

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod job_manager;
pub mod server;

#[cfg(test)]
mod testing;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use job_manager::{JobManagerClient, JobManagerError};
pub use server::Server;
