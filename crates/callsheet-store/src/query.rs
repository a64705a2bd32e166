use callsheet_core::domain::{CallStatus, TagName};
use rusqlite::types::Value;

pub(crate) const CONTACT_COLUMNS: &str = "contacts.id, contacts.full_name, contacts.first_name, contacts.last_name, contacts.phone_e164, contacts.phone_raw, contacts.call_status, contacts.source, contacts.created_at, contacts.updated_at";

#[derive(Debug, Default, Clone)]
pub struct ContactQuery {
    pub tags: Vec<TagName>,
    pub status: Option<CallStatus>,
}

pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ContactQuery {
    pub fn with_tag(mut self, tag: TagName) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_status(mut self, status: CallStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn to_sql(&self) -> SqlQuery {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        for tag in &self.tags {
            clauses.push(
                "EXISTS (SELECT 1 FROM contact_tags ct INNER JOIN tags t ON t.id = ct.tag_id WHERE ct.contact_id = contacts.id AND t.name = ?)",
            );
            params.push(Value::from(tag.as_str().to_string()));
        }

        if let Some(status) = self.status {
            clauses.push("contacts.call_status = ?");
            params.push(Value::from(status.as_str().to_string()));
        }

        let mut sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY contacts.full_name COLLATE NOCASE ASC, contacts.created_at ASC");

        SqlQuery { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::ContactQuery;
    use callsheet_core::domain::{CallStatus, TagName};

    #[test]
    fn empty_query_has_no_where_clause() {
        let query = ContactQuery::default().to_sql();
        assert!(!query.sql.contains("WHERE"));
        assert!(query.params.is_empty());
    }

    #[test]
    fn tag_and_status_filters_are_anded() {
        let query = ContactQuery::default()
            .with_tag(TagName::new("Donors").expect("tag"))
            .with_status(CallStatus::CallLater)
            .to_sql();
        assert!(query.sql.contains(" AND "));
        assert_eq!(query.params.len(), 2);
    }
}
