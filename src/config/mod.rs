//! Settings and rendered configuration

pub mod settings;
pub mod values;
