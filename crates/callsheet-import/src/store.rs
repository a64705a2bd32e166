use crate::error::Result;
use callsheet_core::domain::{CallStatus, Contact, ContactId, Tag, TagId, TagName};
use callsheet_store::repo::ContactNew;
use callsheet_store::Store;
use chrono::Utc;
use std::collections::HashMap;

/// Fields of a contact created by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_e164: Option<String>,
    pub phone_raw: Option<String>,
    pub call_status: CallStatus,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAssignment {
    Assigned,
    AlreadyPresent,
}

/// Item-level contact store used by the apply step. Nothing here is
/// transactional across calls.
pub trait ContactStore {
    fn list_contacts(&self) -> Result<Vec<Contact>>;
    fn contact_tag_names(&self, ids: &[ContactId]) -> Result<HashMap<ContactId, Vec<String>>>;
    fn create_contact(&mut self, contact: NewContact) -> Result<ContactId>;
    fn list_tags(&self) -> Result<Vec<Tag>>;
    fn create_tag(&mut self, name: TagName) -> Result<Tag>;
    /// Attaching a tag the contact already carries is a success.
    fn ensure_tag_assigned(&mut self, contact: ContactId, tag: TagId) -> Result<TagAssignment>;
}

impl ContactStore for Store {
    fn list_contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts().list_all()?)
    }

    fn contact_tag_names(&self, ids: &[ContactId]) -> Result<HashMap<ContactId, Vec<String>>> {
        Ok(self.tags().list_names_for_contacts(ids)?)
    }

    fn create_contact(&mut self, contact: NewContact) -> Result<ContactId> {
        let created = self.contacts().create(
            Utc::now().timestamp(),
            ContactNew {
                full_name: contact.full_name,
                first_name: contact.first_name,
                last_name: contact.last_name,
                phone_e164: contact.phone_e164,
                phone_raw: contact.phone_raw,
                call_status: contact.call_status,
                source: contact.source,
            },
        )?;
        Ok(created.id)
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags().list()?)
    }

    fn create_tag(&mut self, name: TagName) -> Result<Tag> {
        Ok(self.tags().upsert(name)?)
    }

    fn ensure_tag_assigned(&mut self, contact: ContactId, tag: TagId) -> Result<TagAssignment> {
        if self.tags().ensure_assigned(contact, tag)? {
            Ok(TagAssignment::Assigned)
        } else {
            Ok(TagAssignment::AlreadyPresent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactStore, NewContact, TagAssignment};
    use callsheet_core::domain::{CallStatus, TagName};
    use callsheet_store::Store;

    #[test]
    fn sqlite_store_assigns_tags_idempotently() {
        let mut store = Store::open_in_memory().expect("open");
        store.migrate().expect("migrate");

        let id = store
            .create_contact(NewContact {
                full_name: "Ada Lovelace".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_e164: Some("+972501234567".to_string()),
                phone_raw: Some("050-1234567".to_string()),
                call_status: CallStatus::NotChecked,
                source: Some("donors".to_string()),
            })
            .expect("create contact");
        let tag = store
            .create_tag(TagName::new("donors").expect("tag"))
            .expect("create tag");

        assert_eq!(
            store.ensure_tag_assigned(id, tag.id).expect("assign"),
            TagAssignment::Assigned
        );
        assert_eq!(
            store.ensure_tag_assigned(id, tag.id).expect("assign again"),
            TagAssignment::AlreadyPresent
        );
        let names = store.contact_tag_names(&[id]).expect("names");
        assert_eq!(names[&id], vec!["donors"]);
        assert_eq!(store.list_contacts().expect("list").len(), 1);
    }
}
