use crate::error::{ImportError, Result};
use crate::store::ContactStore;
use callsheet_core::domain::{Contact, ContactId};
use callsheet_store::paths::ensure_private_dir;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BACKUP_PREFIX: &str = "contacts-backup";
const MAX_SAME_DAY_BACKUPS: u32 = 1000;

/// One stored contact as written to the pre-import backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    #[serde(flatten)]
    pub contact: Contact,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub records: usize,
}

/// `contacts-backup-YYYY-MM-DD.json`, then `-2`, `-3`, ... for later runs on
/// the same day.
pub fn backup_file_name(date: NaiveDate, attempt: u32) -> String {
    let day = date.format("%Y-%m-%d");
    if attempt <= 1 {
        format!("{BACKUP_PREFIX}-{day}.json")
    } else {
        format!("{BACKUP_PREFIX}-{day}-{attempt}.json")
    }
}

/// Snapshot of every stored contact with its tag names.
pub fn snapshot<S: ContactStore + ?Sized>(store: &S) -> Result<Vec<BackupRecord>> {
    let contacts = store.list_contacts()?;
    let ids: Vec<ContactId> = contacts.iter().map(|contact| contact.id).collect();
    let mut tags = store.contact_tag_names(&ids)?;
    Ok(contacts
        .into_iter()
        .map(|contact| BackupRecord {
            tags: tags.remove(&contact.id).unwrap_or_default(),
            contact,
        })
        .collect())
}

/// Writes the snapshot into `dir` without ever replacing an earlier backup.
pub fn write_backup<S: ContactStore + ?Sized>(
    store: &S,
    dir: &Path,
    date: NaiveDate,
) -> Result<BackupOutcome> {
    let records = snapshot(store)?;
    if !dir.exists() {
        ensure_private_dir(dir)?;
    }

    let (path, file) = create_unique(dir, date)?;
    persist(&path, file, &records)?;

    info!(path = %path.display(), records = records.len(), "backup written");
    Ok(BackupOutcome {
        path,
        records: records.len(),
    })
}

fn create_unique(dir: &Path, date: NaiveDate) -> Result<(PathBuf, File)> {
    for attempt in 1..=MAX_SAME_DAY_BACKUPS {
        let path = dir.join(backup_file_name(date, attempt));
        match open_new(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ImportError::Backup { path, source }),
        }
    }
    Err(ImportError::Backup {
        path: dir.join(backup_file_name(date, MAX_SAME_DAY_BACKUPS)),
        source: io::Error::new(io::ErrorKind::AlreadyExists, "too many backups for one day"),
    })
}

/// Writes the records to a freshly created backup file. A partial file would
/// hold the date slot and pass for a rollback point, so it is removed on error.
fn persist<W: Write>(path: &Path, file: W, records: &[BackupRecord]) -> Result<()> {
    if let Err(source) = write_records(file, records) {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "partial backup not removed");
        }
        return Err(ImportError::Backup {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn write_records<W: Write>(file: W, records: &[BackupRecord]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(unix)]
fn open_new(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_new(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, persist, write_backup, BackupRecord};
    use crate::error::{ImportError, ImportErrorKind};
    use crate::store::{ContactStore, NewContact};
    use callsheet_core::domain::{CallStatus, TagName};
    use callsheet_store::Store;
    use chrono::NaiveDate;
    use std::fs;
    use std::io::{self, Write};
    use tempfile::TempDir;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).expect("date")
    }

    #[test]
    fn file_names_are_dated_and_suffixed() {
        assert_eq!(backup_file_name(date(), 1), "contacts-backup-2024-03-07.json");
        assert_eq!(backup_file_name(date(), 3), "contacts-backup-2024-03-07-3.json");
    }

    #[test]
    fn backups_include_tags_and_never_overwrite() {
        let mut store = Store::open_in_memory().expect("open");
        store.migrate().expect("migrate");
        let id = store
            .create_contact(NewContact {
                full_name: "Ada Lovelace".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone_e164: Some("+972501234567".to_string()),
                phone_raw: None,
                call_status: CallStatus::NotChecked,
                source: None,
            })
            .expect("create");
        let tag = store
            .create_tag(TagName::new("donors").expect("tag"))
            .expect("tag");
        store.ensure_tag_assigned(id, tag.id).expect("assign");

        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("backups");
        let first = write_backup(&store, &dir, date()).expect("first backup");
        let second = write_backup(&store, &dir, date()).expect("second backup");
        assert_ne!(first.path, second.path);
        assert!(second
            .path
            .ends_with("contacts-backup-2024-03-07-2.json"));

        let data = fs::read_to_string(&first.path).expect("read backup");
        let records: Vec<BackupRecord> = serde_json::from_str(&data).expect("parse backup");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contact.full_name, "Ada Lovelace");
        assert_eq!(records[0].tags, vec!["donors"]);
    }

    #[test]
    fn failed_write_leaves_no_partial_backup() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(backup_file_name(date(), 1));
        fs::write(&path, "[").expect("create slot");

        let err = persist(&path, FullDisk, &[]).unwrap_err();
        assert!(matches!(err, ImportError::Backup { .. }));
        assert_eq!(err.kind(), ImportErrorKind::Io);
        assert!(!path.exists());
    }
}
