pub mod events;
pub mod metrics_defs;
pub mod registry;
