//! Identifier allocation under concurrency: uniqueness, density, and
//! per-year reset.
//! Testing library/framework: Rust built-in test framework with Tokio
//! async runtime (#[tokio::test]).

use std::collections::HashSet;
use std::sync::Arc;

use solped_engine::{
    Actor, InMemoryStore, LifecycleCoordinator, NewRequisition, RequisitionItem, Role,
    SequenceAllocator, SequenceConfig, SolpedEngineConfig, StaticUserDirectory,
};
use tokio::task::JoinSet;
use tokio_test::assert_ok;

fn item() -> RequisitionItem {
    RequisitionItem {
        quantity: 1.0,
        unit: "pcs".to_string(),
        name: "seal kit".to_string(),
        specification: None,
        brand: None,
        suggested_link: None,
        observations: None,
        unit_price: None,
    }
}

fn payload() -> NewRequisition {
    NewRequisition {
        items: vec![item()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_concurrent_allocations_never_collide() {
    let store = Arc::new(InMemoryStore::new());
    let allocator = Arc::new(SequenceAllocator::new(
        store,
        SequenceConfig::default(),
    ));

    let mut tasks = JoinSet::new();
    for _ in 0..50 {
        let allocator = allocator.clone();
        tasks.spawn(async move { allocator.next(2025).await });
    }

    let mut ids = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        let id = assert_ok!(result.unwrap());
        assert!(ids.insert(id.clone()), "duplicate id {}", id);
    }

    assert_eq!(ids.len(), 50);
    // The in-memory counter has no aborted allocations, so the numbers
    // are dense as well as unique.
    let sequences: HashSet<u32> = ids.iter().map(|id| id.sequence()).collect();
    assert_eq!(sequences, (1..=50).collect::<HashSet<u32>>());
}

#[tokio::test]
async fn test_concurrent_creations_yield_distinct_requisitions() {
    let store = Arc::new(InMemoryStore::new());
    let directory = Arc::new(StaticUserDirectory::new());
    let coordinator = Arc::new(LifecycleCoordinator::new(
        store,
        directory,
        &SolpedEngineConfig::default(),
    ));

    let mut tasks = JoinSet::new();
    for user in 0..20 {
        let coordinator = coordinator.clone();
        tasks.spawn(async move {
            coordinator
                .create(&Actor::new(user, Role::Requester), payload())
                .await
        });
    }

    let mut ids = HashSet::new();
    while let Some(result) = tasks.join_next().await {
        let created = result.unwrap().expect("creation should succeed");
        assert!(ids.insert(created.id.clone()), "duplicate id {}", created.id);
    }
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_each_year_restarts_at_one() {
    let store = Arc::new(InMemoryStore::new());
    let allocator = SequenceAllocator::new(store, SequenceConfig::default());

    assert_eq!(allocator.next(2025).await.unwrap().as_str(), "SP-2025-000001");
    assert_eq!(allocator.next(2025).await.unwrap().as_str(), "SP-2025-000002");
    assert_eq!(allocator.next(2026).await.unwrap().as_str(), "SP-2026-000001");
    // The older year keeps counting where it left off.
    assert_eq!(allocator.next(2025).await.unwrap().as_str(), "SP-2025-000003");
}
