use crate::peer::PeerConnectionEntry;
use meshcall_core::ParticipantId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("an entry for {0} already exists")]
    DuplicateEntry(ParticipantId),
}

/// At most one entry per remote participant, iterated in creation order.
///
/// Owned by the session loop and only mutated from it. There is no capacity
/// bound: a full mesh costs O(N²) connections, so it suits small rooms only.
#[derive(Default)]
pub struct PeerConnectionRegistry {
    entries: HashMap<ParticipantId, PeerConnectionEntry>,
    order: Vec<ParticipantId>,
}

impl PeerConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callers check membership first; a duplicate is a programming error.
    pub fn create(
        &mut self,
        remote_id: ParticipantId,
    ) -> Result<&mut PeerConnectionEntry, RegistryError> {
        match self.entries.entry(remote_id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateEntry(remote_id)),
            Entry::Vacant(slot) => {
                self.order.push(remote_id.clone());
                Ok(slot.insert(PeerConnectionEntry::new(remote_id)))
            }
        }
    }

    pub fn get(&self, remote_id: &ParticipantId) -> Option<&PeerConnectionEntry> {
        self.entries.get(remote_id)
    }

    pub fn get_mut(&mut self, remote_id: &ParticipantId) -> Option<&mut PeerConnectionEntry> {
        self.entries.get_mut(remote_id)
    }

    pub fn contains(&self, remote_id: &ParticipantId) -> bool {
        self.entries.contains_key(remote_id)
    }

    /// No-op when absent.
    pub fn remove(&mut self, remote_id: &ParticipantId) -> Option<PeerConnectionEntry> {
        let entry = self.entries.remove(remote_id)?;
        self.order.retain(|id| id != remote_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> &[ParticipantId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerConnectionEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&PeerConnectionEntry),
    {
        self.iter().for_each(f);
    }

    /// Empties the registry, handing entries back in creation order.
    pub fn drain(&mut self) -> Vec<PeerConnectionEntry> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }
}
