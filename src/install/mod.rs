//! Installation modules for Harbor and its prerequisites

pub mod certificate;
pub mod harbor;
pub mod health;
