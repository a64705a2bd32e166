use callsheet_core::domain::{ContactId, TagId, TagName};
use callsheet_store::error::StoreErrorKind;
use callsheet_store::repo::ContactNew;
use callsheet_store::Store;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn contact(store: &Store, name: &str) -> ContactId {
    store
        .contacts()
        .create(
            1_700_000_000,
            ContactNew {
                full_name: name.to_string(),
                ..Default::default()
            },
        )
        .expect("create contact")
        .id
}

#[test]
fn upsert_returns_existing_tag() {
    let store = store();
    let first = store
        .tags()
        .upsert(TagName::new("נצור לשונך").expect("tag"))
        .expect("upsert");
    let second = store
        .tags()
        .upsert(TagName::new("  נצור  לשונך ").expect("tag"))
        .expect("upsert again");
    assert_eq!(first.id, second.id);
    assert_eq!(first.name.as_str(), "נצור-לשונך");
    assert_eq!(store.tags().list().expect("list").len(), 1);
}

#[test]
fn ensure_assigned_is_idempotent() {
    let store = store();
    let id = contact(&store, "Ada");
    let tag = store
        .tags()
        .upsert(TagName::new("volunteers").expect("tag"))
        .expect("upsert");

    assert!(store.tags().ensure_assigned(id, tag.id).expect("assign"));
    assert!(!store.tags().ensure_assigned(id, tag.id).expect("assign again"));

    let names = store
        .tags()
        .list_names_for_contacts(&[id])
        .expect("names");
    assert_eq!(names[&id], vec!["volunteers"]);
}

#[test]
fn ensure_assigned_reports_unknown_ids() {
    let store = store();
    let id = contact(&store, "Ada");
    let err = store
        .tags()
        .ensure_assigned(id, TagId::new())
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);

    let tag = store
        .tags()
        .upsert(TagName::new("volunteers").expect("tag"))
        .expect("upsert");
    let err = store
        .tags()
        .ensure_assigned(ContactId::new(), tag.id)
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn counts_and_names_per_contact() {
    let store = store();
    let ada = contact(&store, "Ada");
    let grace = contact(&store, "Grace");
    let donors = store
        .tags()
        .upsert(TagName::new("donors").expect("tag"))
        .expect("upsert");
    let board = store
        .tags()
        .upsert(TagName::new("board").expect("tag"))
        .expect("upsert");
    store.tags().ensure_assigned(ada, donors.id).expect("assign");
    store.tags().ensure_assigned(ada, board.id).expect("assign");
    store.tags().ensure_assigned(grace, donors.id).expect("assign");

    let counts: Vec<(String, i64)> = store
        .tags()
        .list_with_counts()
        .expect("counts")
        .into_iter()
        .map(|(tag, count)| (tag.name.as_str().to_string(), count))
        .collect();
    assert_eq!(
        counts,
        vec![("board".to_string(), 1), ("donors".to_string(), 2)]
    );

    let names = store
        .tags()
        .list_names_for_contacts(&[ada, grace])
        .expect("names");
    assert_eq!(names[&ada], vec!["board", "donors"]);
    assert_eq!(names[&grace], vec!["donors"]);
}
