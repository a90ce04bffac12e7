// Auction-scoped cache of bid request parameters. Populated when the tracked
// bidder's requests go out, read back when one of its bids is rejected, and
// dropped with the auction so the map only ever holds live auctions.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use shared::gauge;

use crate::metrics_defs::PARAM_CACHE_AUCTIONS;

#[derive(Default)]
pub(crate) struct ParamCache {
    auctions: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl ParamCache {
    pub fn insert(&self, auction_id: &str, bid_id: &str, params: Value) {
        let mut auctions = self.auctions.write();
        auctions
            .entry(auction_id.to_string())
            .or_default()
            .insert(bid_id.to_string(), params);
        gauge!(PARAM_CACHE_AUCTIONS).set(auctions.len() as f64);
    }

    pub fn get(&self, auction_id: &str, bid_id: &str) -> Option<Value> {
        let auctions = self.auctions.read();
        auctions.get(auction_id)?.get(bid_id).cloned()
    }

    pub fn evict_auction(&self, auction_id: &str) {
        let mut auctions = self.auctions.write();
        auctions.remove(auction_id);
        gauge!(PARAM_CACHE_AUCTIONS).set(auctions.len() as f64);
    }

    #[cfg(test)]
    pub fn auction_len(&self, auction_id: &str) -> usize {
        self.auctions
            .read()
            .get(auction_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_are_scoped_by_auction() {
        let cache = ParamCache::default();
        cache.insert("a-1", "b-1", json!({"region": "eu"}));
        cache.insert("a-2", "b-1", json!({"region": "us"}));

        assert_eq!(cache.get("a-1", "b-1"), Some(json!({"region": "eu"})));
        assert_eq!(cache.get("a-2", "b-1"), Some(json!({"region": "us"})));
        assert_eq!(cache.get("a-1", "b-2"), None);
        assert_eq!(cache.get("a-3", "b-1"), None);
    }

    #[test]
    fn evicting_an_auction_drops_all_its_entries() {
        let cache = ParamCache::default();
        cache.insert("a-1", "b-1", json!(1));
        cache.insert("a-1", "b-2", json!(2));
        cache.insert("a-2", "b-1", json!(3));

        cache.evict_auction("a-1");

        assert_eq!(cache.auction_len("a-1"), 0);
        assert_eq!(cache.get("a-1", "b-1"), None);
        assert_eq!(cache.get("a-2", "b-1"), Some(json!(3)));
    }
}
