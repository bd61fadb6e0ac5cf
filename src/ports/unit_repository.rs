//! Unit repository port.

use async_trait::async_trait;

use crate::domain::foundation::{ClientId, DomainError, UnitId};
use crate::domain::unit::Unit;

/// Repository port for Unit aggregate persistence.
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, unit: &Unit) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the unit doesn't exist
    async fn update(&self, unit: &Unit) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &UnitId) -> Result<Option<Unit>, DomainError>;

    /// Units of a client, ordered by name. With `parent`, only its direct
    /// children.
    async fn find_by_client(
        &self,
        client_id: &ClientId,
        parent: Option<&UnitId>,
    ) -> Result<Vec<Unit>, DomainError>;

    /// Count units of a client (for the `max_units` limit).
    async fn count_by_client(&self, client_id: &ClientId) -> Result<usize, DomainError>;

    /// # Errors
    ///
    /// - `NotFound` if the unit doesn't exist
    async fn delete(&self, id: &UnitId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn UnitRepository) {}
    }
}
