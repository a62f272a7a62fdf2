//! Operational metrics for the ticket store.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the host
//! process installs a recorder.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticket_store_operations_total{operation,outcome}` - Operations by result (`ok` or an error code)
//! - `ticket_store_tickets_reserved_total` - Successful buys
//! - `ticket_store_tickets_revoked_total` - Successful revokes
//!
//! ## Gauges
//! - `ticket_store_tickets` - Tickets currently stored by this process

use metrics::{describe_counter, describe_gauge};

/// Register all metric descriptions.
///
/// This should be called once at startup, before any metrics are recorded.
pub fn register_metrics() {
    describe_counter!(
        "ticket_store_operations_total",
        "Ticket store operations by operation name and outcome"
    );
    describe_counter!(
        "ticket_store_tickets_reserved_total",
        "Total number of successful ticket purchases"
    );
    describe_counter!(
        "ticket_store_tickets_revoked_total",
        "Total number of successful ticket revocations"
    );
    describe_gauge!(
        "ticket_store_tickets",
        "Current number of stored tickets"
    );

    tracing::info!("Ticket store metrics registered");
}

/// Record the outcome of one operation.
///
/// `outcome` is `"ok"` or a `TicketError::code()`.
pub fn record_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "ticket_store_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);

    match (operation, outcome) {
        ("add_ticket", "ok") => metrics::gauge!("ticket_store_tickets").increment(1.0),
        ("delete_ticket", "ok") => metrics::gauge!("ticket_store_tickets").decrement(1.0),
        ("buy_ticket", "ok") => metrics::counter!("ticket_store_tickets_reserved_total").increment(1),
        ("revoke_ticket", "ok") => metrics::counter!("ticket_store_tickets_revoked_total").increment(1),
        _ => {}
    }
}

/// Set the stored-tickets gauge, e.g. after opening a persisted table.
#[allow(clippy::cast_precision_loss)] // gauge values are f64
pub fn set_ticket_count(count: usize) {
    metrics::gauge!("ticket_store_tickets").set(count as f64);
    tracing::debug!(count, "Updated ticket count gauge");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use crate::{Principal, TicketPayload, TicketStore};
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    type Captured = Vec<(String, Vec<(String, String)>, DebugValue)>;

    /// Run `f` with a thread-local recorder and return everything it recorded.
    fn capture(f: impl FnOnce()) -> Captured {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, f);

        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, value)| {
                let key = key.key();
                let mut labels: Vec<(String, String)> = key
                    .labels()
                    .map(|l| (l.key().to_string(), l.value().to_string()))
                    .collect();
                labels.sort();
                (key.name().to_string(), labels, value)
            })
            .collect()
    }

    fn counter(captured: &Captured, name: &str, labels: &[(&str, &str)]) -> u64 {
        captured
            .iter()
            .find_map(|(n, l, value)| match value {
                DebugValue::Counter(count)
                    if n == name
                        && l.iter()
                            .map(|(k, v)| (k.as_str(), v.as_str()))
                            .eq(labels.iter().copied()) =>
                {
                    Some(*count)
                }
                _ => None,
            })
            .unwrap_or(0)
    }

    fn gauge(captured: &Captured, name: &str) -> Option<f64> {
        captured.iter().find_map(|(n, _, value)| match value {
            DebugValue::Gauge(v) if n == name => Some(v.0),
            _ => None,
        })
    }

    fn ops(operation: &'static str, outcome: &'static str) -> [(&'static str, &'static str); 2] {
        [("operation", operation), ("outcome", outcome)]
    }

    #[test]
    fn full_lifecycle_is_counted() {
        let captured = capture(|| {
            let store = TicketStore::builder().build();
            let seller = Principal::new("seller-a");

            let ticket = store.add_ticket(TicketPayload::new("Dune", 12), &seller).unwrap();
            store.buy_ticket(&ticket.id).unwrap();
            assert!(store.buy_ticket(&ticket.id).is_err());
            store.revoke_ticket(&ticket.id, &seller).unwrap();
            store.delete_ticket(&ticket.id, &seller).unwrap();
        });

        let total = "ticket_store_operations_total";
        assert_eq!(counter(&captured, total, &ops("add_ticket", "ok")), 1);
        assert_eq!(counter(&captured, total, &ops("buy_ticket", "ok")), 1);
        assert_eq!(counter(&captured, total, &ops("buy_ticket", "already_reserved")), 1);
        assert_eq!(counter(&captured, total, &ops("revoke_ticket", "ok")), 1);
        assert_eq!(counter(&captured, total, &ops("delete_ticket", "ok")), 1);

        // The rejected buy does not count as a reservation.
        assert_eq!(counter(&captured, "ticket_store_tickets_reserved_total", &[]), 1);
        assert_eq!(counter(&captured, "ticket_store_tickets_revoked_total", &[]), 1);

        // Up on add, down on delete.
        assert_eq!(gauge(&captured, "ticket_store_tickets"), Some(0.0));
    }

    #[test]
    fn rejections_are_labelled_with_their_code() {
        let captured = capture(|| {
            let store = TicketStore::builder().build();
            let seller = Principal::new("seller-a");

            assert!(store.add_ticket(TicketPayload::new("", 12), &seller).is_err());
            let ticket = store.add_ticket(TicketPayload::new("Dune", 12), &seller).unwrap();
            store.add_ticket(TicketPayload::new("Alien", 3), &seller).unwrap();
            assert!(store.revoke_ticket(&ticket.id, &seller).is_err());
            assert!(store.revoke_ticket(&ticket.id, &Principal::new("seller-b")).is_err());
        });

        let total = "ticket_store_operations_total";
        assert_eq!(counter(&captured, total, &ops("add_ticket", "invalid_payload")), 1);
        assert_eq!(counter(&captured, total, &ops("add_ticket", "ok")), 2);
        assert_eq!(counter(&captured, total, &ops("revoke_ticket", "not_reserved")), 1);
        assert_eq!(counter(&captured, total, &ops("revoke_ticket", "unauthorized")), 1);
        assert_eq!(counter(&captured, total, &ops("revoke_ticket", "ok")), 0);

        assert_eq!(counter(&captured, "ticket_store_tickets_revoked_total", &[]), 0);
        assert_eq!(gauge(&captured, "ticket_store_tickets"), Some(2.0));
    }
}
