//! Single-object operations and their existence conditions
//!
//! - get: decode in place, NotFound unless ignore_if_absent
//! - put: ignore/fail if exists, fail if absent, before-persist hook
//! - delete: silent unless fail_if_absent

use crate::common::*;

// ============================================================================
// Get
// ============================================================================

#[test]
fn get_decodes_in_place() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);

    let mut person = Person {
        id: "jason".into(),
        ..Default::default()
    };
    ts.get(&mut person, None).unwrap();
    assert_eq!(person, Person::new("jason", "Jason", 30));
}

#[test]
fn get_missing_key_is_not_found() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);

    let err = ts
        .get(&mut Person::new("trump", "", 0), None)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { ref bucket, ref key } if bucket == b"person" && key == b"trump"));
}

#[test]
fn get_missing_bucket_is_not_found() {
    let ts = TestStore::new();
    assert!(ts.get(&mut Wind, None).unwrap_err().is_not_found());
}

#[test]
fn get_ignore_if_absent_leaves_entity_untouched() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().ignore_if_absent();

    let mut ghost = Person::new("ghost", "Casper", 300);
    ts.get(&mut ghost, Some(&condition)).unwrap();
    assert_eq!(ghost, Person::new("ghost", "Casper", 300));

    ts.get(&mut Wind, Some(&condition)).unwrap();
}

#[test]
fn get_undecodable_record_is_decode_error() {
    let ts = TestStore::new();
    ts.update(|tx| {
        tx.create_bucket_if_absent(b"car")?
            .put(&key::u32_key(0), b"\xc1 not msgpack")?;
        Ok(())
    })
    .unwrap();

    let err = ts.get(&mut Car::default(), None).unwrap_err();
    assert!(matches!(err, Error::Decode { key: ref k, .. } if k == &key::u32_key(0)));
}

// ============================================================================
// Put
// ============================================================================

#[test]
fn put_overwrites_by_default() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);

    ts.put(&mut Person::new("jason", "Jason", 31), None).unwrap();

    let mut person = Person::new("jason", "", 0);
    ts.get(&mut person, None).unwrap();
    assert_eq!(person.age, 31);
}

#[test]
fn put_ignore_if_exists_keeps_stored_value() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().ignore_if_exists();

    ts.put(&mut Person::new("jason", "Impostor", 99), Some(&condition))
        .unwrap();

    let mut person = Person::new("jason", "", 0);
    ts.get(&mut person, None).unwrap();
    assert_eq!(person, Person::new("jason", "Jason", 30));

    ts.put(&mut Person::new("tom", "Tom", 12), Some(&condition))
        .unwrap();
    assert!(ts.exist(&Person::new("tom", "", 0)).unwrap());
}

#[test]
fn put_fail_if_exists() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().fail_if_exists();

    let err = ts
        .put(&mut Person::new("jason", "Impostor", 99), Some(&condition))
        .unwrap_err();
    assert!(err.is_already_exists());

    ts.put(&mut Person::new("tom", "Tom", 12), Some(&condition))
        .unwrap();
}

#[test]
fn put_fail_if_absent_does_not_create_bucket() {
    let ts = TestStore::new();
    let condition = Condition::new().fail_if_absent();

    let err = ts
        .put(&mut Person::new("jason", "Jason", 30), Some(&condition))
        .unwrap_err();
    assert!(err.is_not_found());

    let buckets = ts.view(|tx| Ok(tx.bucket_names()?)).unwrap();
    assert!(buckets.is_empty());
}

#[test]
fn put_fail_if_absent_requires_key() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().fail_if_absent();

    assert!(ts
        .put(&mut Person::new("tom", "Tom", 12), Some(&condition))
        .unwrap_err()
        .is_not_found());
    ts.put(&mut Person::new("jason", "Jason", 31), Some(&condition))
        .unwrap();
}

#[test]
fn put_hook_assigns_increasing_ids() {
    let ts = TestStore::new();

    let mut first = Car::new("model t", 1908);
    let mut second = Car::new("beetle", 1938);
    ts.put(&mut first, None).unwrap();
    ts.put(&mut second, None).unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);

    let mut loaded = Car::with_id(second.id, "", 0);
    ts.get(&mut loaded, None).unwrap();
    assert_eq!(loaded, second);
}

#[test]
fn put_hook_keeps_explicit_id() {
    let ts = TestStore::new();
    let mut car = Car::with_id(77, "delorean", 1981);
    ts.put(&mut car, None).unwrap();
    assert_eq!(car.id, 77);
    assert!(ts.exist(&Car::with_id(77, "", 0)).unwrap());
}

#[test]
fn put_hook_rejection_writes_nothing() {
    let ts = TestStore::new();
    let err = ts.put(&mut Car::new("", 2000), None).unwrap_err();
    assert!(matches!(err, Error::Rejected { .. }));
    assert_eq!(ts.count(&Car::default(), None).unwrap(), 0);
}

#[test]
fn put_ignored_write_does_not_advance_sequence() {
    let ts = TestStore::new();
    let mut car = Car::new("mini", 1959);
    ts.put(&mut car, None).unwrap();

    let mut again = Car::with_id(car.id, "mini", 1959);
    ts.put(&mut again, Some(&Condition::new().ignore_if_exists()))
        .unwrap();

    let mut next = Car::new("fiat", 1957);
    ts.put(&mut next, None).unwrap();
    assert_eq!(next.id, car.id + 1);
}

#[test]
fn put_unencodable_is_encode_error() {
    let ts = TestStore::new();
    let mut glitch = Glitch {
        id: "g".into(),
        poison: true,
    };
    let err = ts.put(&mut glitch, None).unwrap_err();
    assert!(matches!(err, Error::Encode { .. }));
}

#[test]
fn put_empty_key_is_storage_error() {
    let ts = TestStore::new();
    let err = ts.put(&mut Person::new("", "Nobody", 0), None).unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn delete_removes_record() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let jason = Person::new("jason", "", 0);

    ts.delete(&jason, None).unwrap();
    assert!(!ts.exist(&jason).unwrap());
}

#[test]
fn delete_missing_is_silent_without_condition() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    ts.delete(&Person::new("trump", "", 0), None).unwrap();
    ts.delete(&Wind, None).unwrap();
}

#[test]
fn delete_empty_key_is_silent() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    ts.delete(&Person::new("", "", 0), None).unwrap();
    ts.mdelete(&[&Person::new("", "", 0), &Person::new("jason", "", 0)], None)
        .unwrap();
    assert_eq!(ts.count(&Person::default(), None).unwrap(), 0);

    let condition = Condition::new().fail_if_absent();
    let err = ts
        .delete(&Person::new("", "", 0), Some(&condition))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { ref key, .. } if key.is_empty()));
}

#[test]
fn delete_fail_if_absent() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().fail_if_absent();

    assert!(ts
        .delete(&Person::new("trump", "", 0), Some(&condition))
        .unwrap_err()
        .is_not_found());
    assert!(ts.delete(&Wind, Some(&condition)).unwrap_err().is_not_found());
    ts.delete(&Person::new("jason", "", 0), Some(&condition))
        .unwrap();
}

// ============================================================================
// Exist
// ============================================================================

#[test]
fn exist_probes_without_decoding() {
    let ts = TestStore::new();
    ts.update(|tx| {
        tx.create_bucket_if_absent(b"person")?
            .put(b"broken", b"\xff\xff\xff")?;
        Ok(())
    })
    .unwrap();

    assert!(ts.exist(&Person::new("broken", "", 0)).unwrap());
    assert!(!ts.exist(&Person::new("fine", "", 0)).unwrap());
    assert!(!ts.exist(&Wind).unwrap());
}
