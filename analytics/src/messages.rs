//! Outbound message shapes for the collection endpoint.
//!
//! Every message serializes to `{"eventType": ..., ...}` and is posted
//! verbatim as the request body.

use serde::Serialize;
use serde_json::Value;

use shared::events::{AdRender, Bid, BidderRequest};

/// Minimal projection transmitted for other bidders' winning bids. Price and
/// auction only; the full bid never leaves the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    pub auction_id: String,
}

/// Either a full tracked-bidder bid or the minimal summary of a foreign win.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundBid {
    Full(Box<Bid>),
    Summary(BidSummary),
}

/// Auction summary payload for init, timeout and end events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionData {
    pub auction_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_requests: Option<Vec<BidderRequest>>,
}

/// One message bound for the collection endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    Auction {
        event_type: &'static str,
        auction_data: AuctionData,
    },
    Bid {
        event_type: &'static str,
        bid: OutboundBid,
    },
    BidderError {
        event_type: &'static str,
        error: Value,
        bidder_requests: Vec<BidderRequest>,
    },
    AdRender {
        event_type: &'static str,
        render_data: AdRender,
    },
}
