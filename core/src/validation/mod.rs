//! Invariant verification for flow networks

pub mod correctness;
