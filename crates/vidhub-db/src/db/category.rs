use std::sync::Arc;

use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidhub_core::models::Category;
use vidhub_core::AppError;

use super::map_constraint_error;

/// Storage operations on categories
#[async_trait::async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, name: &str) -> Result<Category, AppError>;

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError>;

    async fn update_category(&self, id: Uuid, name: &str) -> Result<Option<Category>, AppError>;

    /// Fails with `BadRequest` while videos still reference the category.
    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, AppError>;
}

/// Build the PostgreSQL-backed category store
pub fn create_category_store(pool: PgPool) -> Arc<dyn CategoryStore> {
    Arc::new(PostgresCategoryRepository::new(pool))
}

/// Repository for the `categories` table
#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate_name(name: &str) -> String {
    format!("Category '{}' already exists", name)
}

const IN_USE: &str = "Category is still used by videos";

#[async_trait::async_trait]
impl CategoryStore for PostgresCategoryRepository {
    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "insert"))]
    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        sqlx::query_as::<Postgres, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, &duplicate_name(name), IN_USE))
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select"))]
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<Postgres, Category>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select", db.record_id = %id))]
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<Postgres, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "update", db.record_id = %id))]
    async fn update_category(&self, id: Uuid, name: &str) -> Result<Option<Category>, AppError> {
        sqlx::query_as::<Postgres, Category>(
            r#"
            UPDATE categories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, &duplicate_name(name), IN_USE))
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "delete", db.record_id = %id))]
    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        sqlx::query_as::<Postgres, Category>(
            "DELETE FROM categories WHERE id = $1 RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Category already exists", IN_USE))
    }
}
