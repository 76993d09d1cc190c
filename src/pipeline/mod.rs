//! Outbound calls into the remote automation pipeline.

pub mod endpoints;
pub mod trigger;

pub use endpoints::{EndpointPair, Mode, TriggerOperation};
pub use trigger::{AutorunAction, PipelineTrigger, TriggerClient, TriggerOutcome};
