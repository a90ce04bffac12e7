//! Replay captured auction event logs through registered adapters.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use shared::events::AuctionEvent;
use shared::registry::AdapterManager;

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("could not read event log: {0}")]
    Io(#[from] std::io::Error),
}

/// Feed each event in the log through every registered adapter.
///
/// Logs are JSON lines of `{eventType, args}` objects, the same encoding the
/// host dispatches. Unparsable lines are skipped with a warning so a
/// partially captured log still replays.
pub fn replay_file(path: &Path, adapters: &AdapterManager) -> Result<usize, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut replayed = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuctionEvent>(&line) {
            Ok(event) => {
                adapters.emit(&event);
                replayed += 1;
            }
            Err(err) => {
                tracing::warn!(line = index + 1, %err, "skipping unparsable event");
            }
        }
    }

    Ok(replayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared::events::EventType;
    use shared::registry::{AnalyticsAdapter, AnalyticsRegistration};
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingAdapter {
        seen: Mutex<Vec<EventType>>,
    }

    impl AnalyticsAdapter for RecordingAdapter {
        fn track(&self, event: &AuctionEvent) {
            self.seen.lock().push(event.event_type());
        }
    }

    #[test]
    fn replays_valid_lines_and_skips_the_rest() {
        let mut log = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(log, r#"{{"eventType": "auctionInit", "args": {{"auctionId": "a-1"}}}}"#)
            .unwrap();
        writeln!(log).unwrap();
        writeln!(log, "not json").unwrap();
        writeln!(
            log,
            r#"{{"eventType": "bidWon", "args": {{"bidderCode": "rtbhouse", "auctionId": "a-1"}}}}"#
        )
        .unwrap();

        let adapter = Arc::new(RecordingAdapter::default());
        let mut adapters = AdapterManager::new();
        adapters.register_analytics_adapter(AnalyticsRegistration {
            adapter: adapter.clone(),
            code: "recording".into(),
            gvlid: 0,
        });

        let replayed = replay_file(log.path(), &adapters).expect("replay");

        assert_eq!(replayed, 2);
        assert_eq!(
            *adapter.seen.lock(),
            vec![EventType::AuctionInit, EventType::BidWon]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let adapters = AdapterManager::new();
        assert!(replay_file(Path::new("/nonexistent/events.ndjson"), &adapters).is_err());
    }
}
