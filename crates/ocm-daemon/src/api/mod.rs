//! API layer for the deploy-manager daemon

pub mod rest;

pub use rest::create_router;
