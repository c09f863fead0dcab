use crate::roster::store::RosterError;
use crate::roster::types::{GroupId, NpcGroup, NpcId};
use chrono::Utc;

/// Named groupings of NPCs. Persisted by the owning store.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<NpcGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(groups: Vec<NpcGroup>) -> Self {
        Self { groups }
    }

    pub fn list(&self) -> &[NpcGroup] {
        &self.groups
    }

    pub fn get(&self, id: GroupId) -> Option<&NpcGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// First group carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&NpcGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn add_group(&mut self, name: &str) -> GroupId {
        let group = NpcGroup {
            id: GroupId::new(),
            name: name.to_string(),
            npc_ids: Vec::new(),
            created_at: Utc::now(),
        };
        let id = group.id;
        self.groups.push(group);
        id
    }

    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<(), RosterError> {
        self.group_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub fn delete_group(&mut self, id: GroupId) -> Result<(), RosterError> {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        if self.groups.len() == before {
            return Err(RosterError::GroupNotFound(id.0.to_string()));
        }
        Ok(())
    }

    pub fn add_member(&mut self, id: GroupId, npc: NpcId) -> Result<(), RosterError> {
        let group = self.group_mut(id)?;
        if !group.npc_ids.contains(&npc) {
            group.npc_ids.push(npc);
        }
        Ok(())
    }

    pub fn remove_member(&mut self, id: GroupId, npc: NpcId) -> Result<(), RosterError> {
        self.group_mut(id)?.npc_ids.retain(|n| *n != npc);
        Ok(())
    }

    pub fn move_member(&mut self, npc: NpcId, from: GroupId, to: GroupId) -> Result<(), RosterError> {
        // Validate both ends first so a bad target doesn't orphan the member.
        self.group_mut(to)?;
        self.remove_member(from, npc)?;
        self.add_member(to, npc)
    }

    /// Drop an NPC from every group, e.g. after it is deleted from the roster.
    pub fn forget_npc(&mut self, npc: NpcId) {
        for group in &mut self.groups {
            group.npc_ids.retain(|n| *n != npc);
        }
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut NpcGroup, RosterError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| RosterError::GroupNotFound(id.0.to_string()))
    }
}
