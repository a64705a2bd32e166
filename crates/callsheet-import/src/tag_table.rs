use crate::error::Result;
use crate::store::ContactStore;
use callsheet_core::domain::{Tag, TagName};
use std::collections::HashMap;
use tracing::info;

/// Category tags by name, loaded from the store once per run.
///
/// The table is only trusted between `load` and the next `invalidate`; an
/// unloaded table answers every lookup with a miss.
#[derive(Debug, Default)]
pub struct TagTable {
    by_name: HashMap<TagName, Tag>,
    loaded: bool,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.by_name.clear();
        self.loaded = false;
    }

    pub fn load<S: ContactStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.by_name = store
            .list_tags()?
            .into_iter()
            .map(|tag| (tag.name.clone(), tag))
            .collect();
        self.loaded = true;
        Ok(())
    }

    pub fn get(&self, name: &TagName) -> Option<&Tag> {
        if !self.loaded {
            return None;
        }
        self.by_name.get(name)
    }

    /// Returns the tag, creating it in the store when the table has no entry.
    /// The flag is `true` when a tag was created.
    pub fn ensure<S: ContactStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &TagName,
    ) -> Result<(Tag, bool)> {
        if !self.loaded {
            self.load(&*store)?;
        }
        if let Some(tag) = self.by_name.get(name) {
            return Ok((tag.clone(), false));
        }
        let tag = store.create_tag(name.clone())?;
        info!(tag = %tag.name.as_str(), "tag created");
        self.by_name.insert(tag.name.clone(), tag.clone());
        Ok((tag, true))
    }
}

#[cfg(test)]
mod tests {
    use super::TagTable;
    use crate::store::ContactStore;
    use callsheet_core::domain::TagName;
    use callsheet_store::Store;

    fn store() -> Store {
        let store = Store::open_in_memory().expect("open");
        store.migrate().expect("migrate");
        store
    }

    #[test]
    fn ensure_creates_once_and_caches() {
        let mut store = store();
        let mut table = TagTable::new();
        let name = TagName::new("Donors").expect("tag");

        let (first, created) = table.ensure(&mut store, &name).expect("ensure");
        assert!(created);
        let (second, created) = table.ensure(&mut store, &name).expect("ensure again");
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(store.list_tags().expect("list").len(), 1);
    }

    #[test]
    fn invalidate_forgets_and_reload_sees_store() {
        let mut store = store();
        let name = TagName::new("donors").expect("tag");
        store.create_tag(name.clone()).expect("create");

        let mut table = TagTable::new();
        assert!(table.get(&name).is_none());
        table.load(&store).expect("load");
        assert!(table.get(&name).is_some());

        table.invalidate();
        assert!(table.get(&name).is_none());

        let (_, created) = table.ensure(&mut store, &name).expect("ensure");
        assert!(!created);
        assert!(table.get(&name).is_some());
        assert_eq!(store.list_tags().expect("list").len(), 1);
    }
}
