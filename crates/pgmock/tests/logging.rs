//! Tracing output of the mock connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use pgmock::{MockConn, PgConnection};

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn subscriber(captured: &Captured) -> impl tracing::Subscriber + Send + Sync {
    let writer = captured.clone();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
}

// =============================================================================
// Call Logging
// =============================================================================

#[tokio::test]
async fn test_rejected_call_logs_warning() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let mock = MockConn::new().unwrap();
    mock.expect_begin();

    assert!(mock.ping().await.is_err());

    let logs = captured.contents();
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("call rejected"), "{logs}");
    assert!(logs.contains("call=Ping()"), "{logs}");
}

#[tokio::test]
async fn test_matched_call_logs_in_span() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let mock = MockConn::new().unwrap();
    mock.expect_ping();
    mock.ping().await.unwrap();

    let logs = captured.contents();
    assert!(logs.contains("call matched"), "{logs}");
    assert!(logs.contains("pgmock.ping"), "{logs}");
    assert!(!logs.contains("call rejected"), "{logs}");
}

#[tokio::test]
async fn test_unmet_expectations_log_warning() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let mock = MockConn::new().unwrap();
    mock.expect_commit();
    assert!(mock.expectations_were_met().is_err());

    let logs = captured.contents();
    assert!(logs.contains("unfulfilled expectations"), "{logs}");
    assert!(logs.contains("count=1"), "{logs}");
}
