use super::PositionRepository;
use crate::domain::{Owner, Position, PositionId};
use std::collections::BTreeMap;

/// Positions held in memory.
///
/// Uses BTreeMap so listings come back in a deterministic order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPositionRepository {
    positions: BTreeMap<PositionId, Position>,
}

impl InMemoryPositionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl PositionRepository for InMemoryPositionRepository {
    fn get(&self, id: &PositionId) -> Option<Position> {
        self.positions.get(id).cloned()
    }

    fn save(&mut self, position: Position) {
        self.positions.insert(position.id, position);
    }

    fn remove(&mut self, id: &PositionId) -> Option<Position> {
        self.positions.remove(id)
    }

    fn list_by_owner(&self, owner: &Owner) -> Vec<Position> {
        self.positions
            .values()
            .filter(|p| &p.owner == owner)
            .cloned()
            .collect()
    }

    fn open_positions(&self) -> Vec<Position> {
        self.positions
            .values()
            .filter(|p| p.is_open)
            .cloned()
            .collect()
    }
}
