//! District repository.

use std::sync::Arc;

use crate::entities::{district, District};
use civiq_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};

/// District repository for database operations.
#[derive(Clone)]
pub struct DistrictRepository {
    db: Arc<DatabaseConnection>,
}

impl DistrictRepository {
    /// Create a new district repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a district by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<district::Model>> {
        District::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a district by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<district::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("District not found: {id}")))
    }

    /// Create a new district.
    pub async fn create(&self, model: district::ActiveModel) -> AppResult<district::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a district.
    pub async fn update(&self, model: district::ActiveModel) -> AppResult<district::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all districts, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<district::Model>> {
        District::find()
            .order_by_asc(district::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

}
