//! Batch operations: mget, mput, mdelete
//!
//! Batches run in one transaction and mix entity types freely.

use crate::common::*;

#[test]
fn mput_mixed_types_then_mget() {
    let ts = TestStore::new();

    let mut jason = Person::new("jason", "Jason", 30);
    let mut car = Car::new("beetle", 1938);
    ts.mput(&mut [&mut jason, &mut car], None).unwrap();
    assert!(car.id > 0);

    let mut person = Person::new("jason", "", 0);
    let mut loaded = Car::with_id(car.id, "", 0);
    ts.mget(&mut [&mut person, &mut loaded], None).unwrap();
    assert_eq!(person, jason);
    assert_eq!(loaded, car);
}

#[test]
fn mput_is_all_or_nothing() {
    let ts = TestStore::new();

    let mut a = Person::new("a", "Alpha", 1);
    let mut b = Glitch {
        id: "b".into(),
        poison: true,
    };
    let err = ts.mput(&mut [&mut a, &mut b], None).unwrap_err();
    assert!(matches!(err, Error::Encode { .. }));

    assert!(!ts.exist(&Person::new("a", "", 0)).unwrap());
    assert_eq!(ts.count(&Person::default(), None).unwrap(), 0);
}

#[test]
fn mput_failed_batch_does_not_consume_sequence() {
    let ts = TestStore::new();

    let mut ok = Car::new("first", 2001);
    let mut bad = Car::new("", 2002);
    assert!(ts.mput(&mut [&mut ok, &mut bad], None).is_err());

    let mut retry = Car::new("first", 2001);
    ts.put(&mut retry, None).unwrap();
    assert_eq!(retry.id, 1);
}

#[test]
fn mput_with_condition_applies_to_each() {
    let ts = TestStore::new().with_people(&[("b", "Bravo", 2)]);
    let condition = Condition::new().fail_if_exists();

    let mut a = Person::new("a", "Alpha", 1);
    let mut b = Person::new("b", "Impostor", 99);
    let err = ts.mput(&mut [&mut a, &mut b], Some(&condition)).unwrap_err();
    assert!(err.is_already_exists());
    assert!(!ts.exist(&Person::new("a", "", 0)).unwrap());
}

#[test]
fn mget_stops_at_first_missing() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);

    let mut jason = Person::new("jason", "", 0);
    let mut trump = Person::new("trump", "", 0);
    let err = ts.mget(&mut [&mut jason, &mut trump], None).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(jason.name, "Jason");
}

#[test]
fn mget_ignore_if_absent() {
    let ts = TestStore::new().with_people(&[("jason", "Jason", 30)]);
    let condition = Condition::new().ignore_if_absent();

    let mut jason = Person::new("jason", "", 0);
    let mut ghost = Person::new("ghost", "Casper", 300);
    let mut wind = Wind;
    ts.mget(&mut [&mut jason, &mut ghost, &mut wind], Some(&condition))
        .unwrap();
    assert_eq!(jason.age, 30);
    assert_eq!(ghost.name, "Casper");
}

#[test]
fn mdelete_removes_all() {
    let ts = TestStore::new().with_people(&[("a", "A", 1), ("b", "B", 2), ("c", "C", 3)]);

    let a = Person::new("a", "", 0);
    let c = Person::new("c", "", 0);
    ts.mdelete(&[&a, &c], None).unwrap();

    assert_eq!(ids(&ts.scan::<Person>(None).unwrap()), ["b"]);
}

#[test]
fn mdelete_fail_if_absent_rolls_back() {
    let ts = TestStore::new().with_people(&[("a", "A", 1), ("b", "B", 2)]);
    let condition = Condition::new().fail_if_absent();

    let a = Person::new("a", "", 0);
    let missing = Person::new("zed", "", 0);
    let err = ts.mdelete(&[&a, &missing], Some(&condition)).unwrap_err();
    assert!(err.is_not_found());

    assert!(ts.exist(&a).unwrap());
}

#[test]
fn empty_batches_are_noops() {
    let ts = TestStore::new();
    ts.mput(&mut [], None).unwrap();
    ts.mget(&mut [], None).unwrap();
    ts.mdelete(&[], None).unwrap();
}
