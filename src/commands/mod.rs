//! Command implementations for harbor-installer CLI

pub mod install;
pub mod render;
pub mod status;
pub mod uninstall;
