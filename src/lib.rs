//! harbor-installer - installs the Harbor registry onto a Kubernetes cluster with Helm

pub mod commands;
pub mod config;
pub mod install;
pub mod k8s;
pub mod utils;
