//! Metrics definitions for identity resolution.

use shared::metrics_defs::{MetricDef, MetricType};

pub const ENVELOPE_DELEGATED: MetricDef = MetricDef {
    name: "identity.envelope.delegated",
    metric_type: MetricType::Counter,
    description: "Envelopes obtained from the delegated resolver",
};

pub const ENVELOPE_DIRECT: MetricDef = MetricDef {
    name: "identity.envelope.direct",
    metric_type: MetricType::Counter,
    description: "Envelopes obtained from the direct endpoint",
};

pub const ENVELOPE_FETCH_FAILED: MetricDef = MetricDef {
    name: "identity.envelope.fetch_failed",
    metric_type: MetricType::Counter,
    description: "Envelope fetches that failed or returned an unusable body",
};

pub const ALL_METRICS: &[MetricDef] = &[ENVELOPE_DELEGATED, ENVELOPE_DIRECT, ENVELOPE_FETCH_FAILED];
