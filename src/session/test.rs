use super::*;

const TIMEOUT: Duration = Duration::from_secs(1800);

#[test]
fn create_and_lookup() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    assert!(session.is_new());
    assert!(store.is_valid(session.id()));
    assert_eq!(store.len(), 1);
    assert!(store.get(session.id()).is_some());
    assert!(store.get("missing").is_none());
}

#[test]
fn ids_are_unique() {
    let store = SessionStore::new(TIMEOUT);
    let a = store.create();
    let b = store.create();
    assert_ne!(a.id(), b.id());
}

#[test]
fn attributes_roundtrip() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    session.set_attribute("user", Arc::new("alice".to_owned()));
    let value = session.attribute("user").unwrap();
    assert_eq!(value.downcast_ref::<String>().unwrap(), "alice");
    assert_eq!(session.attribute_names(), ["user"]);
    assert!(session.remove_attribute("user").is_some());
    assert!(session.attribute("user").is_none());
}

#[test]
fn invalidate_is_idempotent() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    session.set_attribute("k", Arc::new(1u32));
    store.invalidate(session.id());
    store.invalidate(session.id());
    assert!(!store.is_valid(session.id()));
    assert!(session.attribute("k").is_none());
}

#[test]
fn expiry_after_inactivity() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    assert!(!session.expired());

    session.set_last_accessed(SystemTime::now() - TIMEOUT - Duration::from_secs(1));
    assert!(session.expired());
    assert!(!store.is_valid(session.id()));
    assert!(store.get(session.id()).is_some());
}

#[test]
fn expiry_boundary_is_inclusive() {
    // idle for exactly the timeout already counts as expired
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    session.set_last_accessed(SystemTime::now() - TIMEOUT);
    assert!(session.expired());
}

#[test]
fn touch_extends_lifetime() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    session.set_last_accessed(SystemTime::now() - TIMEOUT - Duration::from_secs(1));
    session.touch();
    assert!(!session.expired());
}

#[test]
fn sweep_removes_only_expired() {
    let store = SessionStore::new(TIMEOUT);
    let stale = store.create();
    let live = store.create();
    stale.set_last_accessed(SystemTime::now() - TIMEOUT - Duration::from_secs(1));

    assert_eq!(store.sweep_once(), 1);
    assert_eq!(store.len(), 1);
    assert!(store.is_valid(live.id()));
    assert!(store.get(stale.id()).is_none());
}

#[test]
fn per_session_timeout_override() {
    let store = SessionStore::new(TIMEOUT);
    let session = store.create();
    session.set_timeout(Duration::from_secs(10));
    session.set_last_accessed(SystemTime::now() - Duration::from_secs(11));
    assert!(session.expired());
}
