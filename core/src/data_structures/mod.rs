//! Arena-backed network storage

pub mod arc;
pub mod flow_network;
