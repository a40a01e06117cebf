use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use luna_core::memory::{MemoryConfig, Role, SessionMemoryManager, TrimPolicy};
use luna_core::LunaError;

/// Helper function to create a manager with the given exchange capacity
fn create_manager(memory_len: usize) -> SessionMemoryManager {
    SessionMemoryManager::new(MemoryConfig::new(memory_len)).unwrap()
}

fn timestamp(offset_secs: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

#[test]
fn test_capacity_two_keeps_last_two_turns() {
    let manager = create_manager(2);

    for i in 1..=5 {
        manager.append_turn("s", format!("T{i} human"), format!("T{i} agent"), timestamp(i));
    }

    let history = manager.history_view("s");
    let humans: Vec<&str> = history.iter().map(|turn| turn.human.as_str()).collect();
    assert_eq!(humans, vec!["T4 human", "T5 human"]);
    assert_eq!(history[1].agent, "T5 agent");
    assert_eq!(history[1].timestamp, timestamp(5));
}

#[test]
fn test_history_is_most_recent_suffix_for_any_length() {
    for memory_len in 1..=6 {
        for appended in 0..=15usize {
            let manager = create_manager(memory_len);
            for i in 0..appended {
                manager.append_turn("s", format!("h{i}"), format!("a{i}"), timestamp(i as i64));
            }

            let history = manager.history_view("s");
            let expected_len = appended.min(memory_len);
            assert_eq!(history.len(), expected_len, "cap {memory_len}, appended {appended}");

            let first = appended - expected_len;
            for (offset, turn) in history.iter().enumerate() {
                assert_eq!(turn.human, format!("h{}", first + offset));
                assert_eq!(turn.agent, format!("a{}", first + offset));
            }
        }
    }
}

#[test]
fn test_messages_view_alternates_roles() {
    let manager = create_manager(3);
    manager.append_turn("s", "hi", "hello", timestamp(0));
    manager.append_turn("s", "how are you?", "great", timestamp(1));

    let messages = manager.messages_view("s");
    assert_eq!(messages.len(), 4);
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Human, Role::Agent, Role::Human, Role::Agent]);
    assert_eq!(messages[2].content, "how are you?");
}

#[test]
fn test_clear_isolates_sessions() {
    let manager = create_manager(5);
    manager.append_turn("alice", "a1", "r1", timestamp(0));
    manager.append_turn("bob", "b1", "r1", timestamp(0));
    manager.append_turn("bob", "b2", "r2", timestamp(1));

    manager.clear("alice");

    assert!(manager.history_view("alice").is_empty());
    assert_eq!(manager.history_view("bob").len(), 2);

    // Clearing an unknown key is a no-op
    manager.clear("carol");
    assert_eq!(manager.history_view("bob").len(), 2);
}

#[test]
fn test_clear_all_empties_existing_handles() {
    let manager = create_manager(5);
    let handle = manager.get_or_create("s");
    manager.append_turn("s", "h", "a", timestamp(0));
    assert_eq!(handle.len(), 1);

    manager.clear_all();

    assert_eq!(manager.session_count(), 0);
    assert!(handle.is_empty());
    assert!(manager.history_view("s").is_empty());
}

#[test]
fn test_unknown_key_reads_as_empty() {
    let manager = create_manager(5);
    assert!(manager.history_view("never-used").is_empty());
    assert!(manager.messages_view("never-used").is_empty());
}

#[test]
fn test_zero_capacity_is_rejected() {
    let result = SessionMemoryManager::new(MemoryConfig::new(0));
    assert!(matches!(
        result,
        Err(LunaError::InvalidConfiguration { .. })
    ));

    let manager = create_manager(3);
    assert!(manager.set_capacity(0).is_err());
    assert_eq!(manager.capacity(), 3);
}

#[test]
fn test_lazy_shrink_applies_on_next_append() {
    let manager = create_manager(4);
    for i in 0..4 {
        manager.append_turn("s", format!("h{i}"), "a", timestamp(i));
    }

    manager.set_capacity(2).unwrap();
    assert_eq!(manager.history_view("s").len(), 4);

    manager.append_turn("s", "h4", "a", timestamp(4));
    let humans: Vec<String> = manager
        .history_view("s")
        .into_iter()
        .map(|turn| turn.human)
        .collect();
    assert_eq!(humans, vec!["h3", "h4"]);
}

#[test]
fn test_eager_shrink_trims_immediately() {
    let config = MemoryConfig::new(4).with_trim_policy(TrimPolicy::Eager);
    let manager = SessionMemoryManager::new(config).unwrap();
    for key in ["a", "b"] {
        for i in 0..4 {
            manager.append_turn(key, format!("h{i}"), "x", timestamp(i));
        }
    }

    manager.set_capacity(1).unwrap();

    for key in ["a", "b"] {
        let history = manager.history_view(key);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].human, "h3");
    }
}

#[test]
fn test_concurrent_appends_on_distinct_keys() {
    let manager = Arc::new(create_manager(50));

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let key = format!("session-{worker}");
                for i in 0..40 {
                    manager.append_turn(&key, format!("h{i}"), format!("a{i}"), Utc::now());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(manager.session_count(), 8);
    for worker in 0..8 {
        let history = manager.history_view(&format!("session-{worker}"));
        let humans: Vec<String> = history.into_iter().map(|turn| turn.human).collect();
        let expected: Vec<String> = (0..40).map(|i| format!("h{i}")).collect();
        assert_eq!(humans, expected);
    }
}

#[test]
fn test_concurrent_appends_on_same_key_respect_cap() {
    let manager = Arc::new(create_manager(10));

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..100 {
                    manager.append_turn("shared", format!("w{worker}-{i}"), "a", Utc::now());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let history = manager.history_view("shared");
    assert_eq!(history.len(), 10);

    // Each worker's own turns stay in the order it appended them
    for worker in 0..4 {
        let prefix = format!("w{worker}-");
        let indices: Vec<u32> = history
            .iter()
            .filter_map(|turn| turn.human.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn test_huge_memory_len_is_accepted() {
    let manager = create_manager(usize::MAX);
    for i in 0..3 {
        manager.append_turn("s", format!("h{i}"), "a", timestamp(i));
    }
    assert_eq!(manager.history_view("s").len(), 3);
    assert_eq!(manager.messages_view("s").len(), 6);
}

#[test]
fn test_eager_shrink_racing_appends_keeps_cap() {
    for _ in 0..20 {
        let config = MemoryConfig::new(10).with_trim_policy(TrimPolicy::Eager);
        let manager = Arc::new(SessionMemoryManager::new(config).unwrap());
        let done = Arc::new(AtomicBool::new(false));

        let appenders: Vec<_> = (0..4)
            .map(|worker| {
                let manager = Arc::clone(&manager);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut i = 0;
                    while !done.load(Ordering::Acquire) {
                        manager.append_turn("shared", format!("w{worker}-{i}"), "a", Utc::now());
                        i += 1;
                    }
                })
            })
            .collect();

        for round in 0..50 {
            let cap = if round % 2 == 0 { 10 } else { 2 };
            manager.set_capacity(cap).unwrap();
        }
        manager.set_capacity(2).unwrap();
        let after_shrink = manager.history_view("shared").len();
        done.store(true, Ordering::Release);
        for appender in appenders {
            appender.join().unwrap();
        }

        // Every append that overlapped the final shrink is either trimmed by
        // it or read the new cap itself.
        assert!(after_shrink <= 2, "history held {after_shrink} turns");
        assert!(manager.history_view("shared").len() <= 2);
    }
}

#[test]
fn test_clear_all_racing_appends_loses_nothing_afterwards() {
    let manager = Arc::new(create_manager(1_000));
    let clears_finished = Arc::new(AtomicUsize::new(0));
    let clears_started = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let clearer = {
        let manager = Arc::clone(&manager);
        let started = Arc::clone(&clears_started);
        let finished = Arc::clone(&clears_finished);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                started.fetch_add(1, Ordering::SeqCst);
                manager.clear_all();
                finished.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    let appenders: Vec<_> = (0..4)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            let started = Arc::clone(&clears_started);
            let finished = Arc::clone(&clears_finished);
            thread::spawn(move || {
                let key = format!("session-{worker}");
                for i in 0..500 {
                    let human = format!("h{i}");
                    let finished_before = finished.load(Ordering::SeqCst);
                    manager.append_turn(&key, human.as_str(), "a", Utc::now());
                    let visible = manager
                        .history_view(&key)
                        .iter()
                        .any(|turn| turn.human == human);

                    // A missing turn needs a clear that was still running when
                    // the append began.
                    if !visible {
                        assert!(
                            started.load(Ordering::SeqCst) > finished_before,
                            "turn {human} vanished without an overlapping clear"
                        );
                    }
                }
            })
        })
        .collect();

    for appender in appenders {
        appender.join().unwrap();
    }
    done.store(true, Ordering::Release);
    clearer.join().unwrap();

    // Once clearing stops, appends always land in the registered session
    for worker in 0..4 {
        let key = format!("session-{worker}");
        manager.append_turn(&key, "final", "a", Utc::now());
        let history = manager.history_view(&key);
        assert_eq!(history.last().map(|turn| turn.human.as_str()), Some("final"));
    }
    assert_eq!(clears_started.load(Ordering::SeqCst), clears_finished.load(Ordering::SeqCst));
}
