// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::{info, warn};

use crate::error::{DeleteError, LoadError};
use crate::ids::ItemId;
use crate::model::{Item, NewItem};

pub const DELETE_PROMPT: &str = "delete this saved place?";

pub trait ItemCollection {
    fn load_all(&mut self) -> Result<Vec<Item>>;
    fn delete_by_id(&mut self, id: &ItemId) -> Result<()>;
    fn create(&mut self, item: &NewItem) -> Result<ItemId>;
}

pub trait ConfirmPort {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> ConfirmPort for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub trait NotifyPort {
    fn notify(&mut self, notice: &Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Deleted { id: ItemId },
    DeleteDeclined { id: ItemId },
    DeleteFailed { id: ItemId, reason: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Self::Deleted { .. } => "place deleted".to_owned(),
            Self::DeleteDeclined { .. } => "delete canceled".to_owned(),
            Self::DeleteFailed { reason, .. } => {
                format!("delete failed: {reason} -- try again later")
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::DeleteFailed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

#[derive(Debug)]
pub struct ItemStore<C> {
    collection: C,
    items: Vec<Item>,
}

impl<C: ItemCollection> ItemStore<C> {
    pub fn new(collection: C) -> Self {
        Self {
            collection,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut C {
        &mut self.collection
    }

    pub fn load(&mut self) -> Result<usize, LoadError> {
        let fetched = self.collection.load_all();
        self.apply_load(fetched)
    }

    pub fn apply_load(&mut self, fetched: Result<Vec<Item>>) -> Result<usize, LoadError> {
        match fetched {
            Ok(items) => {
                self.items = items;
                info!(count = self.items.len(), "loaded saved places");
                Ok(self.items.len())
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), kept = self.items.len(), "load failed");
                Err(LoadError::new(error))
            }
        }
    }

    // The local list only changes after the collection reports success.
    pub fn delete(
        &mut self,
        id: &ItemId,
        confirm: &mut impl ConfirmPort,
        notify: &mut impl NotifyPort,
    ) -> Result<DeleteOutcome, DeleteError> {
        if !confirm.confirm(DELETE_PROMPT) {
            notify.notify(&Notice::DeleteDeclined { id: id.clone() });
            return Ok(DeleteOutcome::Declined);
        }

        match self.collection.delete_by_id(id) {
            Ok(()) => {
                self.items.retain(|item| &item.id != id);
                info!(%id, remaining = self.items.len(), "deleted saved place");
                notify.notify(&Notice::Deleted { id: id.clone() });
                Ok(DeleteOutcome::Deleted)
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(%id, error = %reason, "delete failed");
                notify.notify(&Notice::DeleteFailed {
                    id: id.clone(),
                    reason,
                });
                Err(DeleteError::new(id.clone(), error))
            }
        }
    }

    pub fn create(&mut self, item: &NewItem) -> Result<ItemId> {
        let id = self.collection.create(item)?;
        info!(%id, "created saved place");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteOutcome, ItemCollection, ItemStore, Notice, NotifyPort};
    use crate::ItemId;
    use crate::model::{City, Item, NewItem};
    use anyhow::{Result, anyhow, bail};
    use time::OffsetDateTime;

    #[derive(Debug, Default)]
    struct FakeCollection {
        rows: Vec<Item>,
        fail_load: bool,
        fail_delete: bool,
        delete_calls: usize,
        next_id: usize,
    }

    impl ItemCollection for FakeCollection {
        fn load_all(&mut self) -> Result<Vec<Item>> {
            if self.fail_load {
                bail!("backend unavailable");
            }
            Ok(self.rows.clone())
        }

        fn delete_by_id(&mut self, id: &ItemId) -> Result<()> {
            self.delete_calls += 1;
            if self.fail_delete {
                return Err(anyhow!("permission denied"));
            }
            self.rows.retain(|row| &row.id != id);
            Ok(())
        }

        fn create(&mut self, item: &NewItem) -> Result<ItemId> {
            self.next_id += 1;
            let id = ItemId::new(format!("new-{}", self.next_id));
            self.rows.insert(0, item.clone().into_item(id.clone()));
            Ok(id)
        }
    }

    #[derive(Debug, Default)]
    struct Notices(Vec<Notice>);

    impl NotifyPort for Notices {
        fn notify(&mut self, notice: &Notice) {
            self.0.push(notice.clone());
        }
    }

    fn row(id: &str) -> Item {
        Item {
            id: ItemId::new(id),
            name: Some(format!("place {id}")),
            address: None,
            url: format!("https://example.com/{id}"),
            category: None,
            city: Some(City::Taichung),
            note: None,
            created_at: None,
        }
    }

    fn loaded_store(ids: &[&str]) -> Result<ItemStore<FakeCollection>> {
        let collection = FakeCollection {
            rows: ids.iter().map(|id| row(id)).collect(),
            ..FakeCollection::default()
        };
        let mut store = ItemStore::new(collection);
        store.load()?;
        Ok(store)
    }

    fn ids(store: &ItemStore<FakeCollection>) -> Vec<String> {
        store.items().iter().map(|item| item.id.to_string()).collect()
    }

    #[test]
    fn failed_load_keeps_previous_items() -> Result<()> {
        let mut store = loaded_store(&["a", "b"])?;
        store.collection_mut().fail_load = true;

        let error = store.load().expect_err("load should fail");
        assert!(format!("{:#}", anyhow::Error::new(error)).contains("backend unavailable"));
        assert_eq!(ids(&store), vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn last_applied_load_wins() -> Result<()> {
        let mut store = loaded_store(&[])?;
        let first = Ok(vec![row("first")]);
        let second = Ok(vec![row("second"), row("third")]);

        store.apply_load(second)?;
        store.apply_load(first)?;
        assert_eq!(ids(&store), vec!["first"]);
        Ok(())
    }

    #[test]
    fn declined_delete_has_no_side_effect() -> Result<()> {
        let mut store = loaded_store(&["a", "b"])?;
        let mut notices = Notices::default();

        let outcome = store.delete(&ItemId::new("a"), &mut |_: &str| false, &mut notices)?;
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(store.collection().delete_calls, 0);
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(
            notices.0,
            vec![Notice::DeleteDeclined {
                id: ItemId::new("a")
            }]
        );
        Ok(())
    }

    #[test]
    fn confirmed_delete_removes_only_that_item() -> Result<()> {
        let mut store = loaded_store(&["a", "b", "c"])?;
        let mut notices = Notices::default();
        let mut asked = Vec::new();

        let outcome = store.delete(
            &ItemId::new("b"),
            &mut |prompt: &str| {
                asked.push(prompt.to_owned());
                true
            },
            &mut notices,
        )?;
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(asked, vec![super::DELETE_PROMPT.to_owned()]);
        assert_eq!(store.collection().delete_calls, 1);
        assert_eq!(ids(&store), vec!["a", "c"]);
        assert_eq!(notices.0[0].message(), "place deleted");
        Ok(())
    }

    #[test]
    fn failed_delete_leaves_list_identical() -> Result<()> {
        let mut store = loaded_store(&["a", "b", "c"])?;
        store.collection_mut().fail_delete = true;
        let mut notices = Notices::default();

        let error = store
            .delete(&ItemId::new("b"), &mut |_: &str| true, &mut notices)
            .expect_err("delete should fail");
        assert_eq!(error.id(), &ItemId::new("b"));
        assert!(format!("{:#}", anyhow::Error::new(error)).contains("permission denied"));
        assert_eq!(store.collection().delete_calls, 1);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert!(notices.0[0].is_error());
        Ok(())
    }

    #[test]
    fn created_item_appears_after_next_load() -> Result<()> {
        let mut store = loaded_store(&["a"])?;
        let id = store.create(&NewItem {
            name: Some("Fresh".to_owned()),
            address: None,
            url: "https://example.com/fresh".to_owned(),
            category: None,
            city: City::Tainan,
            note: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        })?;
        assert!(store.get(&id).is_none());

        store.load()?;
        assert_eq!(store.get(&id).map(|item| item.city), Some(Some(City::Tainan)));
        Ok(())
    }
}
