use callsheet_core::domain::{CallStatus, ContactId, TagName};
use callsheet_store::query::ContactQuery;
use callsheet_store::repo::ContactNew;
use callsheet_store::Store;

fn new_contact(name: &str, phone: &str) -> ContactNew {
    ContactNew {
        full_name: name.to_string(),
        phone_e164: Some(phone.to_string()),
        phone_raw: Some(phone.to_string()),
        source: Some("donors".to_string()),
        ..Default::default()
    }
}

#[test]
fn contact_create_and_get() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let now = 1_700_000_000;
    let contact = store
        .contacts()
        .create(now, new_contact("  David Ben Cohen ", "+972501234567"))
        .expect("create contact");
    assert_eq!(contact.full_name, "David Ben Cohen");
    assert_eq!(contact.first_name, "David");
    assert_eq!(contact.last_name, "Ben Cohen");
    assert_eq!(contact.call_status, CallStatus::NotChecked);

    let fetched = store
        .contacts()
        .get(contact.id)
        .expect("get contact")
        .expect("contact exists");
    assert_eq!(fetched, contact);

    let missing = store.contacts().get(ContactId::new()).expect("get missing");
    assert!(missing.is_none());
}

#[test]
fn create_rejects_blank_name() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let err = store
        .contacts()
        .create(1, new_contact("   ", "+972501234567"))
        .unwrap_err();
    assert!(err.to_string().contains("core error"));
    assert!(store.contacts().list_all().expect("list").is_empty());
}

#[test]
fn empty_phone_values_are_stored_as_null() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let contact = store
        .contacts()
        .create(1, new_contact("Noa", ""))
        .expect("create");
    assert!(contact.phone_e164.is_none());
    assert!(contact.phone_raw.is_none());
}

#[test]
fn list_all_keeps_insertion_order() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let now = 1_700_000_000;
    store
        .contacts()
        .create(now, new_contact("Zehava", "+972501111111"))
        .expect("create");
    store
        .contacts()
        .create(now + 1, new_contact("Avi", "+972502222222"))
        .expect("create");

    let names: Vec<String> = store
        .contacts()
        .list_all()
        .expect("list all")
        .into_iter()
        .map(|contact| contact.full_name)
        .collect();
    assert_eq!(names, vec!["Zehava", "Avi"]);
}

#[test]
fn list_filters_by_tag_and_status() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let now = 1_700_000_000;
    let donors = store
        .tags()
        .upsert(TagName::new("Donors").expect("tag"))
        .expect("upsert tag");
    let tagged = store
        .contacts()
        .create(now, new_contact("Rivka", "+972503333333"))
        .expect("create tagged");
    store
        .tags()
        .ensure_assigned(tagged.id, donors.id)
        .expect("assign");
    let untagged = store
        .contacts()
        .create(now, new_contact("Moshe", "+972504444444"))
        .expect("create untagged");
    store
        .contacts()
        .set_call_status(now + 5, untagged.id, CallStatus::CallLater)
        .expect("set status");

    let by_tag = store
        .contacts()
        .list(&ContactQuery::default().with_tag(donors.name.clone()))
        .expect("list by tag");
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, tagged.id);

    let by_status = store
        .contacts()
        .list(&ContactQuery::default().with_status(CallStatus::CallLater))
        .expect("list by status");
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, untagged.id);
    assert_eq!(by_status[0].updated_at, now + 5);

    let everyone = store
        .contacts()
        .list(&ContactQuery::default())
        .expect("list all");
    let names: Vec<&str> = everyone.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["Moshe", "Rivka"]);
}

#[test]
fn set_call_status_on_missing_contact_is_not_found() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let err = store
        .contacts()
        .set_call_status(1, ContactId::new(), CallStatus::Agreed)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        callsheet_store::error::StoreErrorKind::NotFound
    );
}

#[test]
fn open_creates_missing_parent_directory() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let path = temp.path().join("nested").join("callsheet.sqlite3");
    let store = Store::open(&path).expect("open on disk");
    store.migrate().expect("migrate");
    assert!(path.exists());
}
