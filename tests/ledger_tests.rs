use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use task_tracker::ledger::{Ledger, LedgerError, ListenerKind, DEFAULT_LEDGER_LIMIT};
use task_tracker::time::ManualClock;

fn indices(ledger: &Ledger<u32>) -> Vec<u64> {
    ledger.history_with(|record, _| record.index)
}

#[test]
fn test_sequential_indices_without_eviction() {
    let ledger = Ledger::new(10);

    for n in 0..9u32 {
        let report = ledger.push_one(n);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.reclaimed, 0);
    }

    let history = ledger.history();
    assert_eq!(history.len(), 9);
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.index, i as u64, "index should match insertion order");
        assert_eq!(record.data, i as u32);
    }
}

#[test]
fn test_halving_on_reaching_limit() {
    let ledger = Ledger::new(20);
    let reclaims = Arc::new(Mutex::new(Vec::new()));
    let sink = reclaims.clone();
    ledger.on_reclaim(move |batch| {
        sink.lock().unwrap().push(batch.iter().map(|r| r.index).collect::<Vec<_>>());
        Ok(())
    });

    for n in 0..22u32 {
        ledger.push_one(n);
    }

    // 20th push reaches the limit and drops 10, two more pushes leave 12.
    assert_eq!(ledger.len(), 12);
    assert_eq!(indices(&ledger), (10..22).collect::<Vec<u64>>());

    let reclaims = reclaims.lock().unwrap();
    assert_eq!(reclaims.len(), 1, "Only one reclaim expected");
    assert_eq!(reclaims[0], (0..10).collect::<Vec<u64>>(), "Oldest half, oldest first");
}

#[test]
fn test_indices_survive_repeated_eviction() {
    let ledger = Ledger::new(4);
    for n in 0..11u32 {
        ledger.push_one(n);
    }

    // 4 -> 2, 6 -> 2 ... the counter keeps climbing regardless.
    assert_eq!(ledger.next_index(), 11);
    let kept = indices(&ledger);
    assert!(kept.windows(2).all(|w| w[0] < w[1]), "Indices strictly increase");
    assert_eq!(kept.last(), Some(&10));
}

#[test]
fn test_batch_push_notifies_inserts_before_reclaim() {
    let ledger = Ledger::new(20);
    let events = Arc::new(Mutex::new(Vec::new()));

    let inserts = events.clone();
    ledger.on_insert(move |record| {
        inserts.lock().unwrap().push(format!("insert {}", record.index));
        Ok(())
    });
    let reclaims = events.clone();
    ledger.on_reclaim(move |batch| {
        reclaims.lock().unwrap().push(format!("reclaim {}", batch.len()));
        Ok(())
    });

    let report = ledger.push(0..25u32);
    assert_eq!(report.inserted, 25);
    assert_eq!(report.reclaimed, 12);
    assert_eq!(ledger.len(), 13);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 26);
    for (i, event) in events.iter().take(25).enumerate() {
        assert_eq!(event, &format!("insert {}", i));
    }
    assert_eq!(events[25], "reclaim 12");
}

#[test]
fn test_reclaim_listener_silent_without_eviction() {
    let ledger = Ledger::new(5);
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    ledger.on_reclaim(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    ledger.push(0..4u32);
    assert_eq!(*calls.lock().unwrap(), 0);

    ledger.push_one(4);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_limit_of_one_degenerates() {
    let ledger = Ledger::new(1);
    let batches = Arc::new(Mutex::new(Vec::new()));
    let sink = batches.clone();
    ledger.on_reclaim(move |batch| {
        sink.lock().unwrap().push(batch.iter().map(|r| r.index).collect::<Vec<_>>());
        Ok(())
    });

    // Halving one record removes nothing.
    let report = ledger.push_one(0u32);
    assert_eq!(report.reclaimed, 0);
    assert_eq!(ledger.len(), 1);

    ledger.push_one(1);
    assert_eq!(ledger.len(), 1);
    ledger.push_one(2);
    assert_eq!(ledger.len(), 1);
    assert_eq!(indices(&ledger), vec![2]);

    assert_eq!(*batches.lock().unwrap(), vec![vec![0], vec![1]]);
}

#[test]
fn test_limit_of_zero_uses_default() {
    let ledger = Ledger::new(0);
    assert_eq!(ledger.limit(), DEFAULT_LEDGER_LIMIT);

    ledger.push(0..(DEFAULT_LEDGER_LIMIT as u32 - 1));
    assert_eq!(ledger.len(), DEFAULT_LEDGER_LIMIT - 1, "No eviction below the default limit");
}

#[test]
fn test_listeners_can_use_the_ledger() {
    let ledger = Arc::new(Ledger::new(4));
    let observed = Arc::new(Mutex::new(Vec::new()));

    let reader = Arc::downgrade(&ledger);
    let seen = observed.clone();
    ledger.on_insert(move |record| {
        if let Some(ledger) = reader.upgrade() {
            // The record being notified is already part of the history.
            let len = ledger.len();
            let last = ledger.history_with(|r, _| r.index).last().copied();
            seen.lock().unwrap().push((record.index, len, last));
            if record.data == 1 {
                ledger.push_one(100);
            }
        }
        Ok(())
    });

    let reclaim_reader = Arc::downgrade(&ledger);
    let retained = Arc::new(Mutex::new(Vec::new()));
    let kept = retained.clone();
    ledger.on_reclaim(move |batch| {
        if let Some(ledger) = reclaim_reader.upgrade() {
            kept.lock().unwrap().push((batch.len(), ledger.len()));
            ledger.on_insert(|_| Ok(()));
        }
        Ok(())
    });

    ledger.push([0u32, 1, 2]);

    // Item 1 pushes 100 from inside its own notification; that nested push
    // runs to completion before item 2 is appended.
    assert_eq!(
        *observed.lock().unwrap(),
        vec![(0, 1, Some(0)), (1, 2, Some(1)), (2, 3, Some(2)), (3, 4, Some(3))]
    );
    assert_eq!(ledger.history_with(|r, _| r.data), vec![100, 2]);
    assert_eq!(*retained.lock().unwrap(), vec![(2, 2)]);
}

#[test]
fn test_empty_push_is_noop() {
    let ledger = Ledger::new(1);
    let calls = Arc::new(Mutex::new(0));
    let on_insert = calls.clone();
    ledger.on_insert(move |_| {
        *on_insert.lock().unwrap() += 1;
        Ok(())
    });
    let on_reclaim = calls.clone();
    ledger.on_reclaim(move |_| {
        *on_reclaim.lock().unwrap() += 1;
        Ok(())
    });

    ledger.push_one(7u32);
    ledger.push_one(8);
    let before = *calls.lock().unwrap();
    let next = ledger.next_index();

    let report = ledger.push(Vec::<u32>::new());
    assert_eq!(report.inserted, 0);
    assert_eq!(report.reclaimed, 0);
    assert_eq!(ledger.next_index(), next, "No index consumed");
    assert_eq!(*calls.lock().unwrap(), before, "No listener invoked");
}

#[test]
fn test_history_with_transform_is_read_only() {
    let ledger = Ledger::new(10);
    ledger.push(["a", "b", "c"]);

    let described = ledger.history_with(|record, position| format!("{}:{}:{}", position, record.index, record.data));
    assert_eq!(described, vec!["0:0:a", "1:1:b", "2:2:c"]);
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.history().len(), 3);
}

#[test]
fn test_timestamps_come_from_clock() {
    let clock = Arc::new(ManualClock::new(1_000.0));
    let ledger = Ledger::with_clock(10, clock.clone());

    ledger.push_one(1u32);
    clock.advance(250.5);
    ledger.push_one(2);

    let stamps = ledger.history_with(|record, _| record.timestamp);
    assert_eq!(stamps, vec![1_000, 1_250]);
}

#[test]
fn test_listeners_run_in_registration_order() {
    let ledger = Ledger::new(10);
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut subscriptions = Vec::new();
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        subscriptions.push(ledger.on_insert(move |_| {
            order.lock().unwrap().push(tag);
            Ok(())
        }));
    }

    ledger.push_one(0u32);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    assert_eq!(subscriptions[2].position, 2);
    assert!(subscriptions.iter().all(|s| s.kind == ListenerKind::Insert));
}

#[test]
fn test_failing_listener_is_isolated() {
    let ledger = Ledger::new(2);
    let seen = Arc::new(Mutex::new(Vec::new()));

    ledger.on_insert(|record| Err(anyhow!("sink offline at {}", record.index)));
    let sink = seen.clone();
    ledger.on_insert(move |record| {
        sink.lock().unwrap().push(record.index);
        Ok(())
    });
    ledger.on_reclaim(|_| Err(anyhow!("archive offline")));

    let first = ledger.push_one(0u32);
    assert_eq!(first.failures.len(), 1);
    match &first.failures[0] {
        LedgerError::ListenerFailed { kind, position, index, .. } => {
            assert_eq!(*kind, ListenerKind::Insert);
            assert_eq!(*position, 0);
            assert_eq!(*index, 0);
        }
    }

    let second = ledger.push_one(1);
    assert_eq!(second.reclaimed, 1, "Push completes despite failing listeners");
    assert_eq!(second.failures.len(), 2);
    assert!(second.failures[1].to_string().contains("reclaim listener #0"));
    assert!(second.failures[1].to_string().contains("archive offline"));

    assert_eq!(*seen.lock().unwrap(), vec![0, 1], "Healthy listener still called");
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_default_limit() {
    let ledger: Ledger<u32> = Ledger::default();
    assert_eq!(ledger.limit(), DEFAULT_LEDGER_LIMIT);
    assert!(ledger.is_empty());
}
