//! Metrics definitions for the analytics forwarder.

use shared::metrics_defs::{MetricDef, MetricType};

pub const EVENTS_FORWARDED: MetricDef = MetricDef {
    name: "analytics.events.forwarded",
    metric_type: MetricType::Counter,
    description: "Messages delivered to the collection endpoint",
};

pub const EVENTS_DROPPED: MetricDef = MetricDef {
    name: "analytics.events.dropped",
    metric_type: MetricType::Counter,
    description: "Messages dropped because the delivery queue was full or closed",
};

pub const DELIVERY_FAILED: MetricDef = MetricDef {
    name: "analytics.delivery.failed",
    metric_type: MetricType::Counter,
    description: "Outbound POSTs that failed at the transport level",
};

pub const DELIVERY_SECONDS: MetricDef = MetricDef {
    name: "analytics.delivery.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete one outbound POST in seconds",
};

pub const PARAM_CACHE_AUCTIONS: MetricDef = MetricDef {
    name: "analytics.param_cache.auctions",
    metric_type: MetricType::Gauge,
    description: "Auctions with cached bid params",
};

pub const ALL_METRICS: &[MetricDef] = &[
    EVENTS_FORWARDED,
    EVENTS_DROPPED,
    DELIVERY_FAILED,
    DELIVERY_SECONDS,
    PARAM_CACHE_AUCTIONS,
];
