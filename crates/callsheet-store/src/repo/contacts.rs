use crate::error::{Result, StoreError};
use crate::query::{ContactQuery, CONTACT_COLUMNS};
use callsheet_core::domain::{split_full_name, CallStatus, Contact, ContactId};
use rusqlite::{params, params_from_iter, Connection};
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct ContactNew {
    pub full_name: String,
    /// First/last split; derived from `full_name` when both are empty.
    pub first_name: String,
    pub last_name: String,
    pub phone_e164: Option<String>,
    pub phone_raw: Option<String>,
    pub call_status: CallStatus,
    pub source: Option<String>,
}

pub struct ContactsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ContactsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, input: ContactNew) -> Result<Contact> {
        create_inner(self.conn, now_utc, input)
    }

    pub fn get(&self, id: ContactId) -> Result<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(contact_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn exists(&self, id: ContactId) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Every stored contact in insertion order.
    pub fn list_all(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(contact_from_row(row)?);
        }
        Ok(contacts)
    }

    pub fn list(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        let sql = query.to_sql();
        let mut stmt = self.conn.prepare(&sql.sql)?;
        let mut rows = stmt.query(params_from_iter(sql.params.iter()))?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(contact_from_row(row)?);
        }
        Ok(contacts)
    }

    pub fn set_call_status(
        &self,
        now_utc: i64,
        id: ContactId,
        status: CallStatus,
    ) -> Result<Contact> {
        let updated = self.conn.execute(
            "UPDATE contacts SET call_status = ?1, updated_at = ?2 WHERE id = ?3;",
            params![status.as_str(), now_utc, id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn create_inner(conn: &Connection, now_utc: i64, input: ContactNew) -> Result<Contact> {
    let full_name = input.full_name.trim().to_string();
    let (first_name, last_name) = if input.first_name.is_empty() && input.last_name.is_empty() {
        split_full_name(&full_name)
    } else {
        (input.first_name, input.last_name)
    };
    let contact = Contact {
        id: ContactId::new(),
        full_name,
        first_name,
        last_name,
        phone_e164: input.phone_e164.filter(|value| !value.is_empty()),
        phone_raw: input.phone_raw.filter(|value| !value.is_empty()),
        call_status: input.call_status,
        source: input.source,
        created_at: now_utc,
        updated_at: now_utc,
    };

    contact.validate()?;

    conn.execute(
        "INSERT INTO contacts (id, full_name, first_name, last_name, phone_e164, phone_raw, call_status, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            contact.id.to_string(),
            contact.full_name,
            contact.first_name,
            contact.last_name,
            contact.phone_e164,
            contact.phone_raw,
            contact.call_status.as_str(),
            contact.source,
            contact.created_at,
            contact.updated_at,
        ],
    )?;

    Ok(contact)
}

pub(crate) fn contact_from_row(row: &rusqlite::Row<'_>) -> Result<Contact> {
    let id_str: String = row.get(0)?;
    let id = ContactId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let status_raw: String = row.get(6)?;
    let call_status = CallStatus::from_str(&status_raw)?;
    Ok(Contact {
        id,
        full_name: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone_e164: row.get(4)?,
        phone_raw: row.get(5)?,
        call_status,
        source: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
