//! Kubernetes operations

pub mod helm;
pub mod kubectl;
pub mod resources;
