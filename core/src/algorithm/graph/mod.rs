//! Network flow algorithms
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod max_flow;
pub mod min_cut;

pub use self::max_flow::{max_flow, FlowMetrics, MaxFlowResult, MaxFlowSolver};
pub use self::min_cut::{min_cut, min_cut_from, MinCut};
