//! Partial failures, timeouts and concurrent access around stock.

mod common;

use std::sync::Arc;

use checkout_core::{ErrorKind, ReturnRequest, SaleStatus};
use checkout_engine::EngineError;
use common::*;
use rust_decimal_macros::dec;

fn fakes() -> (Arc<FakeCatalog>, Arc<FakeInventory>, Arc<MemoryStore>) {
    (
        FakeCatalog::with(vec![
            product("P-1", "BEV-001", dec!(1.50), dec!(1.00)),
            product("P-2", "SNK-001", dec!(2.50), dec!(2.00)),
            product("P-3", "GRO-001", dec!(4.00), dec!(3.00)),
        ]),
        FakeInventory::with_stock(&[("P-1", 10), ("P-2", 10), ("P-3", 10)]),
        MemoryStore::new(),
    )
}

/// 2 × P-1, 1 × P-2, 3 × P-3.
fn three_items() -> checkout_core::SaleRequest {
    request(
        vec![
            item("P-1", 2, dec!(1.50), 0, None, dec!(3.00)),
            item("P-2", 1, dec!(2.50), 0, None, dec!(2.50)),
            item("P-3", 3, dec!(4.00), 0, None, dec!(12.00)),
        ],
        6,
        dec!(17.50),
    )
}

#[tokio::test]
async fn test_failed_decrement_rolls_back_earlier_ones() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();

    inventory.fail_decrement("P-3");
    let err = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
    assert!(err.is_retryable());

    // Undone newest first
    assert_eq!(
        inventory.increments(),
        vec![
            InventoryCall::Increment("P-2".into(), 1),
            InventoryCall::Increment("P-1".into(), 2),
        ]
    );
    assert_eq!(inventory.stock("P-1"), 10);
    assert_eq!(inventory.stock("P-2"), 10);
    assert_eq!(inventory.stock("P-3"), 10);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

#[tokio::test]
async fn test_repeated_product_is_checked_as_one_quantity() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service
        .create_sale(request(
            vec![
                item("P-1", 6, dec!(1.50), 0, None, dec!(9.00)),
                item("P-2", 1, dec!(2.50), 0, None, dec!(2.50)),
                item("P-1", 6, dec!(1.50), 0, None, dec!(9.00)),
            ],
            13,
            dec!(20.50),
        ))
        .await
        .unwrap();

    // 12 of P-1 against 10 in stock; each line alone would fit
    let err = service
        .finalize_sale(&draft.id, cash(dec!(20.50)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert_eq!(inventory.decrements(), 0);
    assert_eq!(
        inventory.calls(),
        vec![InventoryCall::Check("P-1".into(), 12)]
    );
    assert_eq!(inventory.stock("P-1"), 10);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

#[tokio::test]
async fn test_repeated_product_within_stock_decrements_per_line() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service
        .create_sale(request(
            vec![
                item("P-1", 4, dec!(1.50), 0, None, dec!(6.00)),
                item("P-1", 5, dec!(1.50), 0, None, dec!(7.50)),
            ],
            9,
            dec!(13.50),
        ))
        .await
        .unwrap();

    service
        .finalize_sale(&draft.id, cash(dec!(13.50)))
        .await
        .unwrap();

    assert_eq!(
        inventory.calls(),
        vec![
            InventoryCall::Check("P-1".into(), 9),
            InventoryCall::Decrement("P-1".into(), 4),
            InventoryCall::Decrement("P-1".into(), 5),
        ]
    );
    assert_eq!(inventory.stock("P-1"), 1);
}

#[tokio::test]
async fn test_store_failure_after_commit_releases_stock() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();

    store.fail_updates();
    let err = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Storage(_)));
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(inventory.decrements(), 3);
    assert_eq!(inventory.increments().len(), 3);
    assert_eq!(inventory.stock("P-3"), 10);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

#[tokio::test]
async fn test_failed_compensation_keeps_original_error() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();

    inventory.fail_decrement("P-2");
    inventory.fail_increments();
    let err = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
    // P-1 stays short; logged for manual correction
    assert_eq!(inventory.stock("P-1"), 8);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

#[tokio::test]
async fn test_unrecorded_return_takes_restock_back() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();
    let sale = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap();
    assert_eq!(inventory.stock("P-3"), 7);

    store.fail_returns();
    let err = service
        .process_return(ReturnRequest {
            sale_id: sale.id.clone(),
            line_item_id: sale.items[2].id.clone(),
            quantity: 2,
            reason: "wrong size".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(inventory.stock("P-3"), 7);
    assert!(service.returns_for_sale(&sale.id).await.unwrap().is_empty());
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stalled_availability_check_times_out() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();

    inventory.stall_checks();
    let err = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::DependencyUnavailable {
            collaborator: "inventory",
            ..
        }
    ));
    assert_eq!(inventory.decrements(), 0);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_catalogue_is_not_an_item_rejection() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);

    catalog.stall();
    let err = service.create_sale(three_items()).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::DependencyUnavailable {
            collaborator: "catalogue",
            ..
        }
    ));
    assert_eq!(store.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_store_write_releases_stock() {
    let (catalog, inventory, store) = fakes();
    let service = service(&catalog, &inventory, &store);
    let draft = service.create_sale(three_items()).await.unwrap();

    store.stall_updates();
    let err = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::DependencyUnavailable {
            collaborator: "sale store",
            ..
        }
    ));
    assert_eq!(inventory.decrements(), 3);
    assert_eq!(inventory.increments().len(), 3);
    assert_eq!(inventory.stock("P-1"), 10);
    assert_eq!(store.stored(&draft.id).unwrap().status, SaleStatus::Draft);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalize_commits_once() {
    let (catalog, inventory, store) = fakes();
    let service = Arc::new(service(&catalog, &inventory, &store));
    let draft = service.create_sale(three_items()).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let sale_id = draft.id.clone();
            tokio::spawn(async move { service.finalize_sale(&sale_id, cash(dec!(17.50))).await })
        })
        .collect();

    let mut finalized = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => finalized += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::IllegalStateTransition),
        }
    }

    assert_eq!(finalized, 1);
    assert_eq!(inventory.decrements(), 3);
    assert_eq!(inventory.stock("P-1"), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_respect_bound() {
    let (catalog, inventory, store) = fakes();
    let service = Arc::new(service(&catalog, &inventory, &store));
    let draft = service.create_sale(three_items()).await.unwrap();
    let sale = service
        .finalize_sale(&draft.id, cash(dec!(17.50)))
        .await
        .unwrap();

    // Five single-unit returns against a line of three
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let service = Arc::clone(&service);
            let request = ReturnRequest {
                sale_id: sale.id.clone(),
                line_item_id: sale.items[2].id.clone(),
                quantity: 1,
                reason: "changed mind".to_string(),
            };
            tokio::spawn(async move { service.process_return(request).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 3);
    assert_eq!(inventory.stock("P-3"), 10);
    let stored = service.get_sale(&sale.id).await.unwrap();
    assert_eq!(stored.items[2].returned_quantity, 3);
}
