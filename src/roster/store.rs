use crate::roster::defaults::default_roster;
use crate::roster::groups::GroupRegistry;
use crate::roster::types::{avatar_color_for, NpcGroup, NpcId, NpcPatch, NpcProfile};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no NPC with id {0:?}")]
    NotFound(NpcId),
    #[error("no group with id {0}")]
    GroupNotFound(String),
}

/// Registry of NPC profiles, keyed by opaque id, plus their groups.
pub trait NpcStore {
    fn list(&self) -> Vec<NpcProfile>;
    fn get(&self, id: NpcId) -> Option<&NpcProfile>;
    fn add(&mut self, name: &str, prompt: &str) -> Result<NpcProfile, RosterError>;
    fn update(&mut self, id: NpcId, patch: NpcPatch) -> Result<NpcProfile, RosterError>;
    /// Removes the profile and its memberships.
    fn delete(&mut self, id: NpcId) -> Result<(), RosterError>;
    fn groups(&self) -> &GroupRegistry;
    /// Run one edit against the groups. Persistent stores save afterwards.
    fn edit_groups(
        &mut self,
        edit: &mut dyn FnMut(&mut GroupRegistry) -> Result<(), RosterError>,
    ) -> Result<(), RosterError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryNpcStore {
    entries: Vec<NpcProfile>,
    groups: GroupRegistry,
}

impl InMemoryNpcStore {
    pub fn new(entries: Vec<NpcProfile>) -> Self {
        Self { entries, groups: GroupRegistry::new() }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_roster())
    }
}

impl NpcStore for InMemoryNpcStore {
    fn list(&self) -> Vec<NpcProfile> {
        self.entries.clone()
    }

    fn get(&self, id: NpcId) -> Option<&NpcProfile> {
        self.entries.iter().find(|p| p.id == id)
    }

    fn add(&mut self, name: &str, prompt: &str) -> Result<NpcProfile, RosterError> {
        let profile = NpcProfile::new(name.trim(), prompt.trim());
        self.entries.push(profile.clone());
        Ok(profile)
    }

    fn update(&mut self, id: NpcId, patch: NpcPatch) -> Result<NpcProfile, RosterError> {
        let profile = self
            .entries
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RosterError::NotFound(id))?;

        if let Some(name) = patch.name {
            profile.avatar_color = avatar_color_for(&name).to_string();
            profile.name = name;
        }
        if let Some(prompt) = patch.prompt {
            profile.prompt = prompt;
        }
        Ok(profile.clone())
    }

    fn delete(&mut self, id: NpcId) -> Result<(), RosterError> {
        let before = self.entries.len();
        self.entries.retain(|p| p.id != id);
        if self.entries.len() == before {
            return Err(RosterError::NotFound(id));
        }
        self.groups.forget_npc(id);
        Ok(())
    }

    fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    fn edit_groups(
        &mut self,
        edit: &mut dyn FnMut(&mut GroupRegistry) -> Result<(), RosterError>,
    ) -> Result<(), RosterError> {
        edit(&mut self.groups)
    }
}

/// JSON-file roster. One document holds the whole list.
///
/// A missing file means "never saved": the built-in roster is served.
/// A file holding `[]` is an explicit empty roster and is honoured as such.
/// Groups live in a sibling `<stem>.groups.json` document.
pub struct FileNpcStore {
    path: PathBuf,
    groups_path: PathBuf,
    inner: InMemoryNpcStore,
}

impl FileNpcStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RosterError> {
        let path = path.into();
        let groups_path = path.with_extension("groups.json");
        let groups: Vec<NpcGroup> = Self::read(&groups_path)?.unwrap_or_default();
        let entries = match Self::read(&path)? {
            Some(entries) => {
                info!(path = %path.display(), count = entries.len(), "Loaded persisted roster");
                entries
            }
            None => {
                info!(path = %path.display(), "No persisted roster, using defaults");
                default_roster()
            }
        };
        Ok(Self {
            path,
            groups_path,
            inner: InMemoryNpcStore { entries, groups: GroupRegistry::from_groups(groups) },
        })
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, RosterError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self) -> Result<(), RosterError> {
        let json = serde_json::to_string_pretty(&self.inner.entries)?;
        fs::write(&self.path, json)?;
        let groups = serde_json::to_string_pretty(self.inner.groups.list())?;
        fs::write(&self.groups_path, groups)?;
        debug!(path = %self.path.display(), "Roster saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NpcStore for FileNpcStore {
    fn list(&self) -> Vec<NpcProfile> {
        self.inner.list()
    }

    fn get(&self, id: NpcId) -> Option<&NpcProfile> {
        self.inner.get(id)
    }

    fn add(&mut self, name: &str, prompt: &str) -> Result<NpcProfile, RosterError> {
        let profile = self.inner.add(name, prompt)?;
        self.save()?;
        Ok(profile)
    }

    fn update(&mut self, id: NpcId, patch: NpcPatch) -> Result<NpcProfile, RosterError> {
        let profile = self.inner.update(id, patch)?;
        self.save()?;
        Ok(profile)
    }

    fn delete(&mut self, id: NpcId) -> Result<(), RosterError> {
        self.inner.delete(id)?;
        self.save()
    }

    fn groups(&self) -> &GroupRegistry {
        self.inner.groups()
    }

    fn edit_groups(
        &mut self,
        edit: &mut dyn FnMut(&mut GroupRegistry) -> Result<(), RosterError>,
    ) -> Result<(), RosterError> {
        self.inner.edit_groups(edit)?;
        self.save()
    }
}
