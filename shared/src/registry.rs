//! Host-side plugin registries.
//!
//! The host framework owns registries like these; plugins used to add
//! themselves as a load-time side effect. Here registration is an explicit
//! call made by the composition root, which keeps plugin construction (and
//! its failure modes) visible.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::events::AuctionEvent;

/// Deferred envelope resolution handed back by a user-id submodule.
pub type IdResolution = Pin<Box<dyn Future<Output = Option<String>> + Send>>;

/// Seam for user-identity submodules.
pub trait UserIdSubmodule: Send + Sync {
    /// Name the submodule registers under.
    fn name(&self) -> &'static str;

    /// Wrap a stored id value into the shape bid requests carry.
    fn decode(&self, value: &str) -> Value;

    /// Begin resolving an id for the given submodule params.
    ///
    /// `None` means the params were unusable and no resolution will happen;
    /// the submodule logs the reason rather than surfacing an error.
    fn request_id(&self, params: &Value) -> Option<IdResolution>;
}

/// Seam for analytics adapters fed from the auction event bus.
///
/// `track` must not block: the host dispatches events synchronously on its
/// own thread and expects adapters to defer any I/O.
pub trait AnalyticsAdapter: Send + Sync {
    fn track(&self, event: &AuctionEvent);
}

/// An analytics adapter together with its host bookkeeping fields.
pub struct AnalyticsRegistration {
    pub adapter: Arc<dyn AnalyticsAdapter>,
    pub code: String,
    pub gvlid: u16,
}

/// Registry of user-id submodules keyed by module family.
#[derive(Default)]
pub struct SubmoduleRegistry {
    families: HashMap<String, Vec<Arc<dyn UserIdSubmodule>>>,
}

impl SubmoduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submodule(&mut self, family: &str, module: Arc<dyn UserIdSubmodule>) {
        tracing::debug!(family, name = module.name(), "registering submodule");
        self.families
            .entry(family.to_string())
            .or_default()
            .push(module);
    }

    pub fn family(&self, family: &str) -> &[Arc<dyn UserIdSubmodule>] {
        self.families
            .get(family)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Registry of analytics adapters.
#[derive(Default)]
pub struct AdapterManager {
    analytics: Vec<AnalyticsRegistration>,
}

impl AdapterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analytics adapter. A second registration under the same
    /// code is ignored, matching how the host treats duplicate adapters.
    pub fn register_analytics_adapter(&mut self, registration: AnalyticsRegistration) {
        if self
            .analytics
            .iter()
            .any(|existing| existing.code == registration.code)
        {
            tracing::warn!(
                code = %registration.code,
                "analytics adapter already registered, ignoring"
            );
            return;
        }
        tracing::debug!(code = %registration.code, gvlid = registration.gvlid, "registering analytics adapter");
        self.analytics.push(registration);
    }

    /// Fan an event out to every registered adapter.
    pub fn emit(&self, event: &AuctionEvent) {
        for registration in &self.analytics {
            registration.adapter.track(event);
        }
    }

    pub fn analytics_codes(&self) -> impl Iterator<Item = &str> {
        self.analytics.iter().map(|r| r.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Auction, EventType};
    use parking_lot::Mutex;
    use serde_json::Map;

    #[derive(Default)]
    struct RecordingAdapter {
        seen: Mutex<Vec<EventType>>,
    }

    impl AnalyticsAdapter for RecordingAdapter {
        fn track(&self, event: &AuctionEvent) {
            self.seen.lock().push(event.event_type());
        }
    }

    fn auction_init() -> AuctionEvent {
        AuctionEvent::AuctionInit(Auction {
            auction_id: "a-1".into(),
            timeout: None,
            metrics: None,
            bidder_requests: None,
            extra: Map::new(),
        })
    }

    #[test]
    fn emit_reaches_every_adapter() {
        let first = Arc::new(RecordingAdapter::default());
        let second = Arc::new(RecordingAdapter::default());

        let mut manager = AdapterManager::new();
        manager.register_analytics_adapter(AnalyticsRegistration {
            adapter: first.clone(),
            code: "one".into(),
            gvlid: 1,
        });
        manager.register_analytics_adapter(AnalyticsRegistration {
            adapter: second.clone(),
            code: "two".into(),
            gvlid: 2,
        });

        manager.emit(&auction_init());

        assert_eq!(*first.seen.lock(), vec![EventType::AuctionInit]);
        assert_eq!(*second.seen.lock(), vec![EventType::AuctionInit]);
    }

    #[test]
    fn duplicate_code_is_ignored() {
        let adapter = Arc::new(RecordingAdapter::default());

        let mut manager = AdapterManager::new();
        manager.register_analytics_adapter(AnalyticsRegistration {
            adapter: adapter.clone(),
            code: "dup".into(),
            gvlid: 1,
        });
        manager.register_analytics_adapter(AnalyticsRegistration {
            adapter: adapter.clone(),
            code: "dup".into(),
            gvlid: 1,
        });

        manager.emit(&auction_init());
        assert_eq!(adapter.seen.lock().len(), 1);
        assert_eq!(manager.analytics_codes().collect::<Vec<_>>(), vec!["dup"]);
    }
}
