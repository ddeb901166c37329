//! Position repository.
//!
//! The ledger reads and writes positions only through [`PositionRepository`];
//! how records are persisted is up to the embedding system.

mod memory;

pub use memory::InMemoryPositionRepository;

use crate::domain::{Owner, Position, PositionId};

/// CRUD by id for position records.
pub trait PositionRepository {
    fn get(&self, id: &PositionId) -> Option<Position>;

    /// Insert or replace the record with `position.id`.
    fn save(&mut self, position: Position);

    fn remove(&mut self, id: &PositionId) -> Option<Position>;

    /// All positions of `owner`, open and closed, in id order.
    fn list_by_owner(&self, owner: &Owner) -> Vec<Position>;

    /// Every open position, in id order.
    fn open_positions(&self) -> Vec<Position>;
}
