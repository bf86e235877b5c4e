//! Defines the polymorphic reference used to link transactions to evidence.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::{db::MapRow, models::DatabaseID};

/// A `(type, id)` reference to an arbitrary domain entity.
///
/// Transactions carry evidence links to the domain objects that justify them
/// (an order, a payment, an invoice). The ledger only ever stores and
/// compares this identity pair; it never dereferences the entity's fields,
/// so any persisted entity with a stable integer ID can serve as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    entity_type: String,
    entity_id: DatabaseID,
}

impl EntityRef {
    /// Create a reference to the entity of type `entity_type` with the ID
    /// `entity_id`.
    ///
    /// `entity_type` is a caller-chosen tag (e.g. `"order"`). Two references
    /// are the same evidence object exactly when both fields are equal.
    pub fn new(entity_type: impl Into<String>, entity_id: DatabaseID) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }

    /// The type tag of the referenced entity.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The ID of the referenced entity.
    pub fn entity_id(&self) -> DatabaseID {
        self.entity_id
    }
}

impl MapRow for EntityRef {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            entity_type: row.get(offset)?,
            entity_id: row.get(offset + 1)?,
        })
    }
}
