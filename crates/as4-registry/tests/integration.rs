//! # Integration Tests
//!
//! Registries working together, and the duplicate cache under concurrent
//! delivery.

use std::sync::{Arc, Barrier};
use std::thread;

use as4_model::{Binding, Mep, MessageKind, PMode, PModeLeg, Party, DEFAULT_MPC_ID};
use as4_profile::Profile;
use as4_registry::{
    DuplicateCache, DuplicateCheck, ManualClock, Mpc, MpcManager, PModeRegistry, RegistryError,
    SledStore,
};
use chrono::{Duration, Utc};

// ============================================================================
// Helpers
// ============================================================================

fn registries() -> (PModeRegistry, Arc<MpcManager>) {
    let mpcs = Arc::new(MpcManager::in_memory());
    let pmodes = PModeRegistry::in_memory(Profile::generic().pmode_validator(), Arc::clone(&mpcs));
    (pmodes, mpcs)
}

fn concurrent_register(
    cache: Arc<DuplicateCache>,
    message_id: &str,
    n: usize,
) -> Vec<DuplicateCheck> {
    let barrier = Arc::new(Barrier::new(n));
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let message_id = message_id.to_string();
            thread::spawn(move || {
                barrier.wait();
                cache
                    .register_and_check(&message_id, "generic", &format!("pm-{i}"))
                    .unwrap()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_one_way_push_agreement_scenario() {
    let (pmodes, _) = registries();
    let mut a1 = PMode::default_for("S", "R", Some("https://r.example/as4"));
    a1.id = "A1".to_string();

    let update = pmodes.create_or_update(a1).unwrap();
    assert!(update.stored, "{}", update.errors.summary());

    let stored = pmodes.get("A1").unwrap().unwrap();
    let legal = |kind| {
        as4_model::is_valid_message_type(stored.mep, stored.binding, kind, true).unwrap()
    };
    assert!(legal(MessageKind::Receipt));
    assert!(!legal(MessageKind::UserMessage));
}

#[test]
fn test_pmode_on_custom_mpc() {
    let (pmodes, mpcs) = registries();
    let mut pmode = PMode::default_for("S", "R", None);
    pmode.mpc_id = "urn:mpc:orders".to_string();

    assert!(!pmodes.create_or_update(pmode.clone()).unwrap().stored);

    mpcs.create(Mpc::new("urn:mpc:orders")).unwrap();
    assert!(pmodes.create_or_update(pmode).unwrap().stored);
}

#[test]
fn test_two_way_sync_agreement_scenario() {
    let (pmodes, _) = registries();
    let a2 = PMode {
        id: "A2".to_string(),
        mep: Mep::TwoWay,
        binding: Binding::Sync,
        initiator: Some(Party::with_default_role("S")),
        responder: Some(Party::with_default_role("R")),
        agreement: "urn:agreement:a2".to_string(),
        mpc_id: DEFAULT_MPC_ID.to_string(),
        leg1: Some(PModeLeg::to_address("https://r.example/as4")),
        leg2: Some(PModeLeg::default()),
    };
    assert!(pmodes.create_or_update(a2).unwrap().stored);

    let legal = |kind, leg1| {
        as4_model::is_valid_message_type(Mep::TwoWay, Binding::Sync, kind, leg1).unwrap()
    };
    for leg1 in [true, false] {
        assert!(legal(MessageKind::UserMessage, leg1));
        assert!(!legal(MessageKind::Receipt, leg1));
    }
}

#[test]
fn test_redelivery_under_same_pmode() {
    let cache = DuplicateCache::in_memory();
    let check = || cache.register_and_check("msg-42", "generic", "A1").unwrap();
    assert_eq!(check(), DuplicateCheck::Continue);
    assert_eq!(check(), DuplicateCheck::Stop);

    let all = cache.get_all().unwrap();
    assert_eq!(all.iter().filter(|i| i.message_id == "msg-42").count(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_same_id_single_winner() {
    for n in [1, 2, 8, 32] {
        let cache = Arc::new(DuplicateCache::in_memory());
        let results = concurrent_register(Arc::clone(&cache), "race", n);

        let winners = results.iter().filter(|r| **r == DuplicateCheck::Continue).count();
        assert_eq!(winners, 1, "n = {n}");
        assert_eq!(results.len() - winners, n - 1);
        assert_eq!(cache.size(), 1);
    }
}

#[test]
fn test_concurrent_same_id_single_winner_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SledStore::open(dir.path().join("dup.db"), as4_registry::sled_store::DUPLICATE_TREE)
            .unwrap();
    let cache = Arc::new(DuplicateCache::new(
        Box::new(store),
        Arc::new(as4_registry::SystemClock),
    ));

    let results = concurrent_register(Arc::clone(&cache), "race", 16);
    assert_eq!(results.iter().filter(|r| !r.is_duplicate()).count(), 1);
}

#[test]
fn test_concurrent_distinct_ids_all_continue() {
    let cache = Arc::new(DuplicateCache::in_memory());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache
                    .register_and_check(&format!("msg-{i}"), "generic", "A1")
                    .unwrap()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), DuplicateCheck::Continue);
    }
    assert_eq!(cache.size(), 16);
}

/// Races one eviction sweep against one registration of the same id, whose
/// previous sighting is older than the eviction boundary. Both must agree
/// on a single outcome.
fn race_eviction_against_registration(cache: Arc<DuplicateCache>, clock: Arc<ManualClock>) {
    let t0 = Utc::now();
    let boundary = t0 + Duration::seconds(30);

    for iteration in 0..200 {
        cache.clear_cache().unwrap();
        clock.set(t0);
        cache.register_and_check("race", "generic", "A1").unwrap();
        clock.set(t0 + Duration::seconds(60));

        let barrier = Arc::new(Barrier::new(2));
        let evictor = {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.evict_all_items_before(boundary).unwrap()
            })
        };
        let registrar = {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.register_and_check("race", "generic", "A1").unwrap()
            })
        };

        let evicted = evictor.join().unwrap().iter().any(|id| id == "race");
        let check = registrar.join().unwrap();
        let item = cache.get_item_of_message_id("race").unwrap();

        let outcome = (check, evicted, item.is_some());
        assert!(
            matches!(
                outcome,
                (DuplicateCheck::Stop, true, false)
                    | (DuplicateCheck::Continue, true, true)
                    | (DuplicateCheck::Stop, false, true)
            ),
            "iteration {iteration}: inconsistent outcome {outcome:?}"
        );
        if let Some(item) = item {
            // A surviving entry is never the stale one the sweep targeted.
            assert_eq!(check == DuplicateCheck::Continue, item.received_at >= boundary);
        }
    }
}

#[test]
fn test_eviction_and_registration_agree() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = Arc::new(DuplicateCache::in_memory_with_clock(clock.clone()));
    race_eviction_against_registration(cache, clock);
}

#[test]
fn test_eviction_and_registration_agree_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SledStore::open(dir.path().join("dup.db"), as4_registry::sled_store::DUPLICATE_TREE)
            .unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = Arc::new(DuplicateCache::new(Box::new(store), clock.clone()));
    race_eviction_against_registration(cache, clock);
}

// ============================================================================
// Durable backing
// ============================================================================

#[test]
fn test_pmodes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("as4.db");
    let pmode = PMode::default_for("S", "R", Some("https://r.example/as4"));

    {
        let db = sled::open(&path).unwrap();
        let mpc_store = SledStore::from_db(&db, "mpcs").unwrap();
        let mpcs = Arc::new(MpcManager::new(Box::new(mpc_store)).unwrap());
        let pmodes = PModeRegistry::new(
            Box::new(SledStore::from_db(&db, "pmodes").unwrap()),
            Profile::generic().pmode_validator(),
            mpcs,
        );
        assert!(pmodes.create_or_update(pmode.clone()).unwrap().stored);
        db.flush().unwrap();
    }

    let db = sled::open(&path).unwrap();
    let mpc_store = SledStore::from_db(&db, "mpcs").unwrap();
    let mpcs = Arc::new(MpcManager::new(Box::new(mpc_store)).unwrap());
    let pmodes = PModeRegistry::new(
        Box::new(SledStore::from_db(&db, "pmodes").unwrap()),
        Profile::generic().pmode_validator(),
        mpcs,
    );
    assert_eq!(pmodes.get(&pmode.id).unwrap().unwrap(), pmode);
    assert!(matches!(pmodes.get(""), Err(RegistryError::EmptyId(_))));
}
