//! Core traits shared by the canonical models

use chrono::{DateTime, Utc};

use crate::types::EntityId;

/// Trait for entities that carry a backend identifier
pub trait Identifiable {
    fn id(&self) -> Option<&EntityId>;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }

    /// Whether this entity carries the given identifier
    fn has_id(&self, id: &EntityId) -> bool {
        self.id() == Some(id)
    }
}

/// Trait for entities with timestamps (created_at, updated_at)
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

/// Trait for entities shown by a human-readable label in lists and pickers
pub trait Named {
    fn display_name(&self) -> &str;
}
