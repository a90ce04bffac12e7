//! Auction lifecycle event model shared between the host seam and plugins.
//!
//! Field names follow the host's camelCase JSON payloads. Every payload
//! carries a flattened `extra` map so fields this crate does not model survive
//! a round trip and can be forwarded without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event kinds emitted by the host event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    AuctionInit,
    AuctionTimeout,
    AuctionEnd,
    BidRequested,
    BidWon,
    BidTimeout,
    BidRejected,
    BidderError,
    AdRenderFailed,
    AdRenderSucceeded,
}

impl EventType {
    /// The host's wire name for this event kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::AuctionInit => "auctionInit",
            EventType::AuctionTimeout => "auctionTimeout",
            EventType::AuctionEnd => "auctionEnd",
            EventType::BidRequested => "bidRequested",
            EventType::BidWon => "bidWon",
            EventType::BidTimeout => "bidTimeout",
            EventType::BidRejected => "bidRejected",
            EventType::BidderError => "bidderError",
            EventType::AdRenderFailed => "adRenderFailed",
            EventType::AdRenderSucceeded => "adRenderSucceeded",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One payload or a list of payloads.
///
/// Timeout and rejection events arrive either way depending on how many bids
/// the host batches into the notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single bid inside a bidder request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub bid_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One bidder's request for a set of ad slots within an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderRequest {
    pub bidder_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<String>,
    #[serde(default)]
    pub bids: Vec<BidRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer_info: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Auction state carried on init, timeout and end events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub auction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder_requests: Option<Vec<BidderRequest>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bid response as carried on won, timeout and rejection events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub bidder_code: String,
    pub auction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error surfaced by a bidder adapter during the auction.
///
/// The host reports either the full list of in-flight bidder requests or, for
/// errors raised outside a request batch, a single `bidder_request`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderError {
    pub error: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder_requests: Option<Vec<BidderRequest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder_request: Option<BidderRequest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Render outcome for a winning ad.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRender {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Bid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A host event bus notification.
///
/// The serialized form matches the host's dispatch shape, an `eventType` tag
/// next to an `args` payload. Captured event logs use the same encoding, one
/// JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "args")]
pub enum AuctionEvent {
    #[serde(rename = "auctionInit")]
    AuctionInit(Auction),
    #[serde(rename = "auctionTimeout")]
    AuctionTimeout(Auction),
    #[serde(rename = "auctionEnd")]
    AuctionEnd(Auction),
    #[serde(rename = "bidRequested")]
    BidRequested(BidderRequest),
    #[serde(rename = "bidWon")]
    BidWon(OneOrMany<Bid>),
    #[serde(rename = "bidTimeout")]
    BidTimeout(OneOrMany<Bid>),
    #[serde(rename = "bidRejected")]
    BidRejected(OneOrMany<Bid>),
    #[serde(rename = "bidderError")]
    BidderError(BidderError),
    #[serde(rename = "adRenderFailed")]
    AdRenderFailed(AdRender),
    #[serde(rename = "adRenderSucceeded")]
    AdRenderSucceeded(AdRender),
}

impl AuctionEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            AuctionEvent::AuctionInit(_) => EventType::AuctionInit,
            AuctionEvent::AuctionTimeout(_) => EventType::AuctionTimeout,
            AuctionEvent::AuctionEnd(_) => EventType::AuctionEnd,
            AuctionEvent::BidRequested(_) => EventType::BidRequested,
            AuctionEvent::BidWon(_) => EventType::BidWon,
            AuctionEvent::BidTimeout(_) => EventType::BidTimeout,
            AuctionEvent::BidRejected(_) => EventType::BidRejected,
            AuctionEvent::BidderError(_) => EventType::BidderError,
            AuctionEvent::AdRenderFailed(_) => EventType::AdRenderFailed,
            AuctionEvent::AdRenderSucceeded(_) => EventType::AdRenderSucceeded,
        }
    }
}
