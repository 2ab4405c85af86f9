//! Hands every document of an anonymous (virtual) user over to the account
//! the user signed in with.

use quire_core::AppError;
use quire_db::DocumentRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct OwnerMigrationService {
    repository: Arc<dyn DocumentRepository>,
}

impl OwnerMigrationService {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Reassign all documents owned by `virtual_user_id` to `new_owner_id`.
    /// Returns the number of documents moved.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(
        &self,
        virtual_user_id: Option<&str>,
        new_owner_id: &str,
    ) -> Result<u64, AppError> {
        let virtual_user_id = virtual_user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Virtual user ID not provided".to_string()))?;

        if virtual_user_id == new_owner_id {
            return Err(AppError::InvalidInput(
                "New user ID must differ from virtual user ID".to_string(),
            ));
        }

        let count = self
            .repository
            .reassign_owner(virtual_user_id, new_owner_id)
            .await?;
        tracing::info!(count, "Migrated documents to new owner");
        Ok(count)
    }
}
