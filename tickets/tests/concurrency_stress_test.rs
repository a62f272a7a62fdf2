//! Concurrency stress tests for competing buyers.
//!
//! Many callers race on the same ticket id; the per-key lock must let exactly
//! one of them through and turn every other attempt into `AlreadyReserved`.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use std::collections::HashSet;
use std::sync::Arc;
use ticket_store::{Principal, TicketError, TicketId, TicketPayload, TicketStore};

fn shared_store(stripes: usize) -> Arc<TicketStore> {
    Arc::new(TicketStore::builder().lock_stripes(stripes).build())
}

/// Test: 100 concurrent buys of one free ticket.
///
/// Verifies that:
/// - Exactly 1 buy succeeds
/// - Exactly 99 buys fail with `AlreadyReserved`
/// - The stored ticket ends up reserved
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_single_ticket_100_concurrent_buys() {
    println!("🧪 Concurrency Stress Test: 100 concurrent buys for 1 ticket");

    let store = shared_store(64);
    let ticket = store
        .add_ticket(TicketPayload::new("Dune", 12), &Principal::new("seller-a"))
        .unwrap();

    let mut handles = vec![];
    for i in 0..100 {
        let store = Arc::clone(&store);
        let id = ticket.id.clone();
        handles.push(tokio::task::spawn_blocking(move || (i, store.buy_ticket(&id))));
    }

    let results: Vec<(usize, Result<_, TicketError>)> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .collect();

    let successes = results.iter().filter(|(_, r)| r.is_ok()).count();
    let already_reserved = results
        .iter()
        .filter(|(_, r)| matches!(r, Err(TicketError::AlreadyReserved { placement: 12 })))
        .count();

    println!("  📊 Successes: {successes}, AlreadyReserved: {already_reserved}");

    assert_eq!(successes, 1, "Expected exactly 1 buy to succeed, got {successes}");
    assert_eq!(
        already_reserved, 99,
        "Expected 99 AlreadyReserved rejections, got {already_reserved}"
    );
    assert!(store.get_ticket(&ticket.id).unwrap().reserved);
}

/// Test: a single stripe serializes unrelated keys but stays correct.
///
/// Ten tickets, ten buyers each; every ticket gets exactly one winner.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_tickets_share_one_stripe() {
    let store = shared_store(1);
    let seller = Principal::new("seller-a");

    let ids: Vec<TicketId> = (1..=10)
        .map(|placement| {
            store
                .add_ticket(TicketPayload::new("Alien", placement), &seller)
                .unwrap()
                .id
        })
        .collect();

    let mut handles = vec![];
    for id in &ids {
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::task::spawn_blocking(move || store.buy_ticket(&id)));
        }
    }

    let winners: Vec<TicketId> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
        .filter_map(Result::ok)
        .map(|ticket| ticket.id)
        .collect();

    assert_eq!(winners.len(), ids.len());
    let unique: HashSet<_> = winners.into_iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(store.get_tickets().unwrap().iter().all(|t| t.reserved));
}

/// Test: concurrent creates never collide on generated ids.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_adds_get_distinct_ids() {
    let store = shared_store(64);

    let handles: Vec<_> = (1..=50)
        .map(|placement| {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                store.add_ticket(
                    TicketPayload::new("Dune", placement),
                    &Principal::new("seller-a"),
                )
            })
        })
        .collect();

    let ids: HashSet<TicketId> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked").unwrap().id)
        .collect();

    assert_eq!(ids.len(), 50);
    assert_eq!(store.len().unwrap(), 50);
}

/// Test: buy/revoke pairs from the seller interleave without losing the final state.
///
/// Each task buys then revokes; a buy may lose to another task's reservation
/// and a revoke may find the ticket already free. The ticket must end free
/// and no operation may fail with anything but those two rejections.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_interleaved_buy_and_revoke() {
    let store = shared_store(64);
    let seller = Principal::new("seller-a");
    let ticket = store.add_ticket(TicketPayload::new("Dune", 7), &seller).unwrap();

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = ticket.id.clone();
            let seller = seller.clone();
            tokio::task::spawn_blocking(move || {
                let bought = store.buy_ticket(&id);
                let revoked = store.revoke_ticket(&id, &seller);
                (bought, revoked)
            })
        })
        .collect();

    for (bought, revoked) in futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("Task panicked"))
    {
        assert!(matches!(bought, Ok(_) | Err(TicketError::AlreadyReserved { .. })));
        assert!(matches!(revoked, Ok(_) | Err(TicketError::NotReserved { .. })));
    }

    assert!(!store.get_ticket(&ticket.id).unwrap().reserved);
}
