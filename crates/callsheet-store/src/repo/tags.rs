use crate::error::{Result, StoreError};
use callsheet_core::domain::{ContactId, Tag, TagId, TagName};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::str::FromStr;

pub struct TagsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> TagsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the tag with this name, creating it when missing.
    pub fn upsert(&self, name: TagName) -> Result<Tag> {
        upsert_inner(self.conn, name)
    }

    pub fn list(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(tag_from_row(row)?);
        }
        Ok(tags)
    }

    pub fn list_with_counts(&self) -> Result<Vec<(Tag, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tags.id, tags.name, COUNT(contact_tags.contact_id) AS cnt
             FROM tags
             LEFT JOIN contact_tags ON tags.id = contact_tags.tag_id
             GROUP BY tags.id, tags.name
             ORDER BY tags.name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let tag = tag_from_row(row)?;
            let count: i64 = row.get(2)?;
            items.push((tag, count));
        }
        Ok(items)
    }

    /// Tag names per contact, for listing many contacts without one query each.
    pub fn list_names_for_contacts(
        &self,
        contact_ids: &[ContactId],
    ) -> Result<HashMap<ContactId, Vec<String>>> {
        let mut map: HashMap<ContactId, Vec<String>> = HashMap::new();
        if contact_ids.is_empty() {
            return Ok(map);
        }

        // Stay under SQLite's bound-parameter limit.
        for chunk in contact_ids.chunks(500) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT contact_tags.contact_id, tags.name
                 FROM contact_tags
                 INNER JOIN tags ON tags.id = contact_tags.tag_id
                 WHERE contact_tags.contact_id IN ({placeholders})
                 ORDER BY tags.name ASC;"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let ids: Vec<String> = chunk.iter().map(ToString::to_string).collect();
            let mut rows = stmt.query(params_from_iter(ids.iter()))?;
            while let Some(row) = rows.next()? {
                let id_str: String = row.get(0)?;
                let id = ContactId::from_str(&id_str)
                    .map_err(|_| StoreError::InvalidId(id_str.clone()))?;
                let name: String = row.get(1)?;
                map.entry(id).or_default().push(name);
            }
        }
        Ok(map)
    }

    /// Attaches the tag; returns `false` when the contact already had it.
    pub fn ensure_assigned(&self, contact_id: ContactId, tag_id: TagId) -> Result<bool> {
        assign_inner(self.conn, contact_id, tag_id)
    }
}

fn assign_inner(conn: &Connection, contact_id: ContactId, tag_id: TagId) -> Result<bool> {
    let contact_known: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?1);",
        [contact_id.to_string()],
        |row| row.get(0),
    )?;
    if contact_known == 0 {
        return Err(StoreError::NotFound(format!("contact {contact_id}")));
    }
    let tag_known: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1);",
        [tag_id.to_string()],
        |row| row.get(0),
    )?;
    if tag_known == 0 {
        return Err(StoreError::NotFound(format!("tag {tag_id}")));
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO contact_tags (contact_id, tag_id) VALUES (?1, ?2);",
        params![contact_id.to_string(), tag_id.to_string()],
    )?;
    Ok(inserted == 1)
}

fn upsert_inner(conn: &Connection, name: TagName) -> Result<Tag> {
    let new_id = TagId::new();
    conn.execute(
        "INSERT INTO tags (id, name) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING;",
        params![new_id.to_string(), name.as_str()],
    )?;

    let mut stmt = conn.prepare("SELECT id, name FROM tags WHERE name = ?1;")?;
    let mut rows = stmt.query([name.as_str()])?;
    if let Some(row) = rows.next()? {
        tag_from_row(row)
    } else {
        Err(StoreError::NotFound(format!("tag {} after upsert", name.as_str())))
    }
}

fn tag_from_row(row: &rusqlite::Row<'_>) -> Result<Tag> {
    let id_str: String = row.get(0)?;
    let name_raw: String = row.get(1)?;
    let id = TagId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let name = TagName::new(&name_raw)?;
    Ok(Tag { id, name })
}
