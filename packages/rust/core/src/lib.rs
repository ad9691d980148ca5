//! Run orchestration for topicscrape.
//!
//! This crate ties together fetching, extraction and record storage: the
//! [`gate`] decides per topic whether work is needed, and the [`pipeline`]
//! drives the gate over every topic of the directory page.

pub mod gate;
pub mod pipeline;

pub use gate::{GateOutcome, PersistenceGate, TopicState};
pub use pipeline::{
    Orchestrator, ProgressReporter, RunReport, SilentProgress, TopicReport, TopicStatus,
};
