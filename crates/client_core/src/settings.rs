use std::sync::Arc;

use anyhow::Result;
use storage::SettingsStore;

use crate::catalog;

pub const SELECTED_GROUP_KEY: &str = "selectedGroup";
pub const SELECTED_SUBGROUP_KEY: &str = "selectedSubgroup";
pub const HAS_STORED_SETTINGS_KEY: &str = "hasStoredSettings";

#[derive(Clone)]
pub struct SelectionStore {
    store: Arc<dyn SettingsStore>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSelection {
    /// `None` when nothing was stored or the stored group left the catalog.
    pub group: Option<String>,
    pub subgroup: Option<String>,
}

impl SelectionStore {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub async fn has_stored_settings(&self) -> Result<bool> {
        self.store.get_bool(HAS_STORED_SETTINGS_KEY).await
    }

    pub async fn load(&self) -> Result<Option<StoredSelection>> {
        if !self.has_stored_settings().await? {
            return Ok(None);
        }

        let group = self
            .store
            .get_string(SELECTED_GROUP_KEY)
            .await?
            .filter(|group| catalog::is_known_group(group));
        let subgroup = self.store.get_string(SELECTED_SUBGROUP_KEY).await?;
        Ok(Some(StoredSelection { group, subgroup }))
    }

    pub async fn save_group(&self, group: &str) -> Result<()> {
        self.store.set_string(SELECTED_GROUP_KEY, group).await?;
        self.store.set_bool(HAS_STORED_SETTINGS_KEY, true).await
    }

    pub async fn save_subgroup(&self, subgroup: &str) -> Result<()> {
        self.store.set_string(SELECTED_SUBGROUP_KEY, subgroup).await?;
        self.store.set_bool(HAS_STORED_SETTINGS_KEY, true).await
    }
}
