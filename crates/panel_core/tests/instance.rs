use panel_core::{fallback_uuid, InstanceId};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn generated_ids_are_distinct_uuids() {
    let first = InstanceId::generate();
    let second = InstanceId::generate();

    assert!(first.is_uuid());
    assert!(second.is_uuid());
    assert_ne!(first, second);
}

#[test]
fn persisted_value_is_trimmed_and_blank_is_absent() {
    let id = InstanceId::from_persisted("  legacy-client-7\n").expect("non-blank id");
    assert_eq!(id.as_str(), "legacy-client-7");
    assert!(!id.is_uuid());

    assert_eq!(InstanceId::from_persisted("   "), None);
}

#[test]
fn fallback_fills_the_version_four_template() {
    let mut rng = StdRng::seed_from_u64(7);
    let id = fallback_uuid(&mut rng);

    assert_eq!(id.len(), 36);
    assert_eq!(&id[14..15], "4");
    assert!(matches!(&id[19..20], "8" | "9" | "a" | "b"));
    assert!(uuid::Uuid::parse_str(&id).is_ok());
}
