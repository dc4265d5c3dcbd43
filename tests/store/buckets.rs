//! Bucket drops

use crate::common::*;

fn seeded() -> TestStore {
    let ts = TestStore::new().with_people(&[("a", "A", 1), ("b", "B", 2)]);
    ts.put(&mut Car::new("beetle", 1938), None).unwrap();
    ts
}

fn bucket_names(ts: &TestStore) -> Vec<Vec<u8>> {
    ts.view(|tx| Ok(tx.bucket_names()?)).unwrap()
}

#[test]
fn delete_bucket_drops_named_buckets() {
    let ts = seeded();
    ts.delete_bucket(&[&Person::default()]).unwrap();

    assert_eq!(bucket_names(&ts), vec![b"car".to_vec()]);
    assert!(ts.scan::<Person>(None).unwrap().is_empty());
    assert_eq!(ts.count(&Car::default(), None).unwrap(), 1);
}

#[test]
fn delete_bucket_ignores_absent_buckets() {
    let ts = seeded();
    ts.delete_bucket(&[&BucketName("nope"), &Wind, &BucketName("car")])
        .unwrap();
    assert_eq!(bucket_names(&ts), vec![b"person".to_vec()]);
}

#[test]
fn delete_bucket_with_empty_name_is_ignored() {
    let ts = seeded();
    ts.delete_bucket(&[&BucketName(""), &BucketName("car")])
        .unwrap();
    assert_eq!(bucket_names(&ts), vec![b"person".to_vec()]);
    assert_eq!(ts.count(&Person::default(), None).unwrap(), 2);
}

#[test]
fn delete_bucket_resets_sequence() {
    let ts = seeded();
    ts.delete_bucket(&[&BucketName("car")]).unwrap();

    let mut car = Car::new("mini", 1959);
    ts.put(&mut car, None).unwrap();
    assert_eq!(car.id, 1);
}

#[test]
fn delete_all_buckets_empties_store() {
    let ts = seeded();
    ts.delete_all_buckets().unwrap();
    assert!(bucket_names(&ts).is_empty());

    let ts = ts.reopen();
    assert!(bucket_names(&ts).is_empty());
    ts.delete_all_buckets().unwrap();
}

#[test]
fn bucket_drop_survives_reopen() {
    let ts = seeded();
    ts.delete_bucket(&[&BucketName("person")]).unwrap();

    let ts = ts.reopen();
    assert_eq!(bucket_names(&ts), vec![b"car".to_vec()]);
}
