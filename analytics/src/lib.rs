//! Analytics adapter forwarding auction events for one tracked bidder.
//!
//! `track` runs on the host's dispatch thread: it filters and reshapes the
//! event synchronously, then hands each outbound message to a bounded queue.
//! A background worker owns the HTTP client and posts queue entries to the
//! collection endpoint one at a time. Delivery is best effort: responses are
//! never consumed, failures are not retried, and a full queue drops the
//! message rather than block the auction.

mod messages;
pub mod metrics_defs;
mod params;

pub use messages::{AuctionData, BidSummary, OutboundBid, OutboundMessage};

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shared::events::{
    AdRender, Auction, AuctionEvent, Bid, BidderError, BidderRequest, EventType, OneOrMany,
};
use shared::registry::{AdapterManager, AnalyticsAdapter, AnalyticsRegistration};
use shared::{counter, histogram};

use crate::metrics_defs::{DELIVERY_FAILED, DELIVERY_SECONDS, EVENTS_DROPPED, EVENTS_FORWARDED};
use crate::params::ParamCache;

pub const BIDDER_CODE: &str = "rtbhouse";
pub const GVLID: u16 = 16;
pub const DEFAULT_ENDPOINT: &str = "https://tracker.creativecdn.com/prebid-analytics";

const QUEUE_CAPACITY: usize = 1024;

#[derive(thiserror::Error, Debug)]
pub enum ForwarderError {
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Forwarder configuration, deserialized from the `analytics` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwarderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_bidder")]
    pub bidder: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_bidder() -> String {
    BIDDER_CODE.to_string()
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        ForwarderConfig {
            endpoint: default_endpoint(),
            bidder: default_bidder(),
        }
    }
}

/// The analytics forwarder. One instance tracks exactly one bidder.
pub struct AnalyticsForwarder {
    bidder: String,
    params: ParamCache,
    tx: Mutex<Option<mpsc::Sender<OutboundMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AnalyticsForwarder {
    /// Build the forwarder and spawn its delivery worker. Must be called
    /// within a tokio runtime.
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwarderError> {
        let client = reqwest::Client::builder().build()?;
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(deliver(client, config.endpoint, rx));

        Ok(AnalyticsForwarder {
            bidder: config.bidder,
            params: ParamCache::default(),
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Drain queued messages and stop the delivery worker. Further events are
    /// dropped. Used by the composition root before shutdown so in-flight
    /// messages are not lost.
    pub async fn close(&self) {
        self.tx.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                tracing::debug!(%err, "delivery worker exited abnormally");
            }
        }
    }

    fn enqueue(&self, message: OutboundMessage) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            tracing::debug!("forwarder is closed, dropping message");
            counter!(EVENTS_DROPPED).increment(1);
            return;
        };
        if tx.try_send(message).is_err() {
            tracing::debug!("delivery queue full, dropping message");
            counter!(EVENTS_DROPPED).increment(1);
        }
    }

    fn handle(&self, event: &AuctionEvent) -> Vec<OutboundMessage> {
        match event {
            AuctionEvent::AuctionInit(auction)
            | AuctionEvent::AuctionTimeout(auction)
            | AuctionEvent::AuctionEnd(auction) => {
                let message = self.auction_summary(event.event_type(), auction);
                if matches!(event, AuctionEvent::AuctionEnd(_)) {
                    // The auction is over; its cached params can no longer be
                    // referenced by a rejection.
                    self.params.evict_auction(&auction.auction_id);
                }
                vec![message]
            }
            AuctionEvent::BidRequested(request) => {
                self.cache_bid_params(request);
                Vec::new()
            }
            AuctionEvent::BidWon(bids)
            | AuctionEvent::BidTimeout(bids)
            | AuctionEvent::BidRejected(bids) => self.bid_messages(event.event_type(), bids),
            AuctionEvent::BidderError(error) => vec![self.bidder_error_message(error)],
            AuctionEvent::AdRenderFailed(render) | AuctionEvent::AdRenderSucceeded(render) => {
                self.render_message(event.event_type(), render)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn auction_summary(&self, event_type: EventType, auction: &Auction) -> OutboundMessage {
        let bidder_requests = auction.bidder_requests.as_ref().map(|requests| {
            requests
                .iter()
                .filter(|request| request.bidder_code == self.bidder)
                .map(strip_privacy_fields)
                .collect()
        });

        OutboundMessage::Auction {
            event_type: event_type.as_str(),
            auction_data: AuctionData {
                auction_id: auction.auction_id.clone(),
                status: event_type.as_str(),
                timeout: auction.timeout,
                metrics: auction.metrics.clone(),
                bidder_requests,
            },
        }
    }

    fn cache_bid_params(&self, request: &BidderRequest) {
        if request.bidder_code != self.bidder {
            return;
        }
        let auction_id = request.auction_id.as_deref().unwrap_or_default();
        for bid in &request.bids {
            let params = match &bid.params {
                // Some adapters configure params as a list; only the first
                // entry applies to the bid.
                Some(Value::Array(values)) if !values.is_empty() => values[0].clone(),
                Some(value) => value.clone(),
                None => continue,
            };
            self.params.insert(auction_id, &bid.bid_id, params);
        }
    }

    fn bid_messages(&self, event_type: EventType, bids: &OneOrMany<Bid>) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        for bid in bids.iter() {
            let outbound = if bid.bidder_code != self.bidder {
                if event_type != EventType::BidWon {
                    continue;
                }
                // Other bidders' wins are reported as price points only.
                OutboundBid::Summary(BidSummary {
                    cpm: bid.cpm,
                    auction_id: bid.auction_id.clone(),
                })
            } else {
                let mut bid = bid.clone();
                if event_type == EventType::BidRejected {
                    bid.params = bid
                        .request_id
                        .as_deref()
                        .and_then(|request_id| self.params.get(&bid.auction_id, request_id));
                }
                OutboundBid::Full(Box::new(bid))
            };
            out.push(OutboundMessage::Bid {
                event_type: event_type.as_str(),
                bid: outbound,
            });
        }
        out
    }

    fn bidder_error_message(&self, event: &BidderError) -> OutboundMessage {
        let bidder_requests = match &event.bidder_requests {
            Some(requests) if !requests.is_empty() => requests
                .iter()
                .filter(|request| request.bidder_code == self.bidder)
                .cloned()
                .collect(),
            // Errors raised outside a request batch carry a single request,
            // forwarded as-is.
            _ => event.bidder_request.clone().into_iter().collect(),
        };

        OutboundMessage::BidderError {
            event_type: EventType::BidderError.as_str(),
            error: event.error.clone(),
            bidder_requests,
        }
    }

    fn render_message(&self, event_type: EventType, render: &AdRender) -> Option<OutboundMessage> {
        let bid = render.bid.as_ref()?;
        if bid.bidder_code != self.bidder {
            return None;
        }
        Some(OutboundMessage::AdRender {
            event_type: event_type.as_str(),
            render_data: render.clone(),
        })
    }
}

impl AnalyticsAdapter for AnalyticsForwarder {
    fn track(&self, event: &AuctionEvent) {
        for message in self.handle(event) {
            self.enqueue(message);
        }
    }
}

fn strip_privacy_fields(request: &BidderRequest) -> BidderRequest {
    // Consent and referrer data never leave the page.
    let mut request = request.clone();
    request.gdpr_consent = None;
    request.referer_info = None;
    request
}

/// Build the forwarder and register it with the host adapter manager.
pub fn register(
    manager: &mut AdapterManager,
    config: ForwarderConfig,
) -> Result<Arc<AnalyticsForwarder>, ForwarderError> {
    let forwarder = Arc::new(AnalyticsForwarder::new(config)?);
    manager.register_analytics_adapter(AnalyticsRegistration {
        adapter: forwarder.clone(),
        code: BIDDER_CODE.to_string(),
        gvlid: GVLID,
    });
    Ok(forwarder)
}

async fn deliver(
    client: reqwest::Client,
    endpoint: String,
    mut rx: mpsc::Receiver<OutboundMessage>,
) {
    while let Some(message) = rx.recv().await {
        let body = match serde_json::to_string(&message) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(%err, "could not serialize analytics message");
                continue;
            }
        };

        let started = Instant::now();
        match client
            .post(&endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
        {
            Ok(_) => {
                counter!(EVENTS_FORWARDED).increment(1);
                histogram!(DELIVERY_SECONDS).record(started.elapsed().as_secs_f64());
            }
            Err(err) => {
                tracing::debug!(%err, "analytics delivery failed");
                counter!(DELIVERY_FAILED).increment(1);
            }
        }
    }
}
