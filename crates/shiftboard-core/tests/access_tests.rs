//! AccessGate tests against persisted slots and scripted identities

use mockall::mock;
use mockall::predicate::always;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shiftboard_core::{AccessError, AccessGate};
use shiftboard_model::{IdentityToken, Session};
use shiftboard_store::{
    FileIdentity, FileSessionSlot, IdentityProvider, MemorySessionSlot, SessionSlot, SlotError,
    StaticIdentity,
};
use std::sync::Arc;

const CODE: &str = "harbor-7";

mock! {
    pub Identity {}

    impl IdentityProvider for Identity {
        fn current(&self) -> Option<IdentityToken>;
    }
}

mock! {
    pub Slot {}

    impl SessionSlot for Slot {
        fn load(&self) -> Result<Option<Session>, SlotError>;
        fn store(&self, session: &Session) -> Result<(), SlotError>;
        fn clear(&self) -> Result<(), SlotError>;
    }
}

fn token(raw: &str) -> IdentityToken {
    IdentityToken::from(raw)
}

#[test]
fn test_grant_survives_restart_with_same_identity() {
    let dir = tempfile::tempdir().unwrap();
    let slot_path = dir.path().join("session.json");
    let identity_path = dir.path().join("identity");

    let identity = Arc::new(FileIdentity::load_or_create(&identity_path).unwrap());
    let first = AccessGate::new(
        Arc::new(FileSessionSlot::new(&slot_path)),
        identity.clone(),
        Some(CODE.to_string()),
    );
    let granted = first
        .grant_access("Grace", "Hopper", CODE, first.live_identity())
        .unwrap();
    assert_eq!(granted.author_label(), "Grace Hopper (GH)");

    // A fresh process sees the same identity file and slot.
    let reloaded = Arc::new(FileIdentity::load_or_create(&identity_path).unwrap());
    let second = AccessGate::new(
        Arc::new(FileSessionSlot::new(&slot_path)),
        reloaded,
        Some(CODE.to_string()),
    );
    assert_eq!(second.current_grant(), Some(granted));
    assert!(second.can_mutate());
}

#[test]
fn test_invalidated_identity_voids_persisted_grant() {
    let dir = tempfile::tempdir().unwrap();
    let slot = Arc::new(FileSessionSlot::new(dir.path().join("session.json")));
    let identity = Arc::new(FileIdentity::load_or_create(dir.path().join("identity")).unwrap());
    let gate = AccessGate::new(slot.clone(), identity.clone(), Some(CODE.to_string()));
    gate.grant_access("Grace", "Hopper", CODE, gate.live_identity())
        .unwrap();

    identity.invalidate().unwrap();

    assert!(!gate.can_mutate());
    assert!(slot.load().unwrap().is_none());

    // Minting a new identity does not resurrect the old grant.
    let fresh = Arc::new(FileIdentity::load_or_create(dir.path().join("identity")).unwrap());
    let regate = AccessGate::new(slot, fresh, Some(CODE.to_string()));
    assert!(regate.current_grant().is_none());
}

#[test]
fn test_identity_consulted_on_every_check() {
    let mut identity = MockIdentity::new();
    let mut seq = mockall::Sequence::new();
    identity
        .expect_current()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Some(token("anon-9")));
    identity
        .expect_current()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| None);

    let slot = Arc::new(MemorySessionSlot::new());
    let gate = AccessGate::new(slot.clone(), Arc::new(identity), Some(CODE.to_string()));
    gate.grant_access("Ada", "Lovelace", CODE, Some(token("anon-9")))
        .unwrap();

    assert!(gate.can_mutate());
    assert!(!gate.can_mutate());
    assert!(slot.load().unwrap().is_none());
}

#[test]
fn test_rejected_code_never_touches_slot() {
    let mut slot = MockSlot::new();
    slot.expect_store().with(always()).times(0);
    let gate = AccessGate::new(
        Arc::new(slot),
        Arc::new(StaticIdentity::new(token("anon-1"))),
        Some(CODE.to_string()),
    );

    let err = gate
        .grant_access("Ada", "Lovelace", "harbor-8", Some(token("anon-1")))
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid-code");
}

#[test]
fn test_unreadable_slot_means_no_grant() {
    let mut slot = MockSlot::new();
    slot.expect_load().returning(|| {
        Err(SlotError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        )))
    });
    slot.expect_clear().times(0);
    let gate = AccessGate::new(
        Arc::new(slot),
        Arc::new(StaticIdentity::new(token("anon-1"))),
        Some(CODE.to_string()),
    );

    assert!(gate.current_grant().is_none());
    assert!(!gate.can_mutate());
}

#[test]
fn test_slot_write_failure_is_reported() {
    let mut slot = MockSlot::new();
    slot.expect_store().times(1).returning(|_| {
        Err(SlotError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    });
    let gate = AccessGate::new(
        Arc::new(slot),
        Arc::new(StaticIdentity::new(token("anon-1"))),
        Some(CODE.to_string()),
    );

    let err = gate
        .grant_access("Ada", "Lovelace", CODE, Some(token("anon-1")))
        .unwrap_err();
    assert!(matches!(err, AccessError::Storage(_)));
}

proptest! {
    #[test]
    fn prop_any_other_code_is_invalid(
        code in "[ -~]{0,16}",
        first in "[A-Za-z]{1,8}",
        last in "[A-Za-z]{1,8}",
        with_identity in any::<bool>(),
    ) {
        prop_assume!(code != CODE);
        let slot = Arc::new(MemorySessionSlot::new());
        let gate = AccessGate::new(
            slot.clone(),
            Arc::new(StaticIdentity::new(token("anon-1"))),
            Some(CODE.to_string()),
        );
        let identity = with_identity.then(|| token("anon-1"));

        let err = gate.grant_access(&first, &last, &code, identity).unwrap_err();

        prop_assert!(matches!(err, AccessError::InvalidCode));
        prop_assert_eq!(err.to_string(), "invalid-code");
        prop_assert!(slot.load().unwrap().is_none());
    }
}
