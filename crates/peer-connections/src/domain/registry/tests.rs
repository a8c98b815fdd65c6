//! Tests for the Connection Registry

use super::*;
use crate::domain::{AttemptId, ConnectionHandle, ConnectionRole, ListenerId, Timestamp};

fn inbound() -> ConnectionRole {
    ConnectionRole::Inbound {
        listener: ListenerId::new(0),
    }
}

fn outbound(attempt: u32) -> ConnectionRole {
    ConnectionRole::Outbound {
        attempt: AttemptId::new(attempt),
    }
}

fn register(registry: &mut ConnectionRegistry<&'static str>, role: ConnectionRole, tag: &'static str) -> ConnectionHandle {
    registry.register(role, None, None, Timestamp::new(1000), tag)
}

// =============================================================================
// TEST GROUP 1: Registration
// =============================================================================

#[test]
fn test_register_returns_distinct_handles() {
    let mut registry = ConnectionRegistry::new();
    let a = register(&mut registry, inbound(), "a");
    let b = register(&mut registry, outbound(0), "b");

    assert_ne!(a, b);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.inbound_count(), 1);
    assert_eq!(registry.outbound_count(), 1);
}

#[test]
fn test_handles_are_never_reused() {
    let mut registry = ConnectionRegistry::new();
    let first = register(&mut registry, inbound(), "a");
    registry.remove(first);
    let second = register(&mut registry, inbound(), "b");

    assert_ne!(first, second);
    assert!(second > first);
}

// =============================================================================
// TEST GROUP 2: Removal keeps other identities intact
// =============================================================================

#[test]
fn test_remove_only_touches_its_entry() {
    let mut registry = ConnectionRegistry::new();
    let a = register(&mut registry, inbound(), "a");
    let b = register(&mut registry, inbound(), "b");
    let c = register(&mut registry, outbound(4), "c");

    let removed = registry.remove(b).unwrap();
    assert_eq!(removed.resource, "b");

    assert_eq!(registry.get(a).unwrap().resource, "a");
    assert_eq!(registry.get(c).unwrap().resource, "c");
    assert_eq!(registry.get(c).unwrap().info.handle, c);
    assert!(!registry.contains(b));
}

#[test]
fn test_double_remove_is_noop() {
    let mut registry = ConnectionRegistry::new();
    let a = register(&mut registry, inbound(), "a");
    let b = register(&mut registry, inbound(), "b");

    assert!(registry.remove(a).is_some());
    assert!(registry.remove(a).is_none());
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(b));
    assert_eq!(registry.stats().total_removed, 1);
}

#[test]
fn test_interleaved_removals() {
    let mut registry = ConnectionRegistry::new();
    let handles: Vec<_> = (0..10).map(|_| register(&mut registry, inbound(), "x")).collect();

    for handle in handles.iter().step_by(2) {
        registry.remove(*handle);
    }

    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(registry.contains(*handle), i % 2 == 1);
    }
}

// =============================================================================
// TEST GROUP 3: Queries
// =============================================================================

#[test]
fn test_outbound_for_attempt() {
    let mut registry = ConnectionRegistry::new();
    register(&mut registry, inbound(), "in");
    let mine = register(&mut registry, outbound(1), "mine");
    register(&mut registry, outbound(2), "other");

    assert_eq!(registry.outbound_for(AttemptId::new(1)), vec![mine]);
    assert!(registry.outbound_for(AttemptId::new(9)).is_empty());
}

#[test]
fn test_snapshot_is_ordered() {
    let mut registry = ConnectionRegistry::new();
    for _ in 0..5 {
        register(&mut registry, inbound(), "x");
    }
    let snapshot = registry.snapshot();
    let handles: Vec<_> = snapshot.iter().map(|info| info.handle.as_u64()).collect();
    assert_eq!(handles, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_drain_and_stats() {
    let mut registry = ConnectionRegistry::new();
    register(&mut registry, inbound(), "a");
    register(&mut registry, outbound(0), "b");

    assert_eq!(registry.drain().len(), 2);
    let stats = registry.stats();
    assert_eq!(stats.live, 0);
    assert_eq!(stats.total_registered, 2);
    assert_eq!(stats.total_removed, 2);
}
