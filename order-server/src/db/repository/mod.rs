//! Query functions over the SQLite pool, grouped by table
//!
//! SQLite access as free async functions taking a `&SqlitePool`.

pub mod dining_table;
pub mod dish;
pub mod order;

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Store failure before it is mapped to a response code
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Required field missing: {0}")]
    RequiredField(String),

    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".into()),
            other => {
                tracing::error!(error = %other, "Database query failed");
                RepoError::Database("Database query failed".into())
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::missing(ErrorCode::NotFound, what),
            RepoError::RequiredField(field) => AppError::required_field(field),
            RepoError::InsertFailed(msg) => AppError::insert_failed(msg),
            RepoError::UpdateFailed(msg) => AppError::update_failed(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::with_message(ErrorCode::DatabaseError, msg),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
pub(crate) mod test_support {
    //! Catalog fixtures shared by repository tests

    use shared::models::TableKind;
    use sqlx::SqlitePool;

    pub async fn pool() -> SqlitePool {
        crate::db::DbService::in_memory().await.unwrap().pool
    }

    pub async fn insert_table(pool: &SqlitePool, id: i64, client_id: i64, number: i64, kind: TableKind) {
        sqlx::query("INSERT INTO dining_table (id, client_id, number, kind) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(client_id)
            .bind(number)
            .bind(kind)
            .execute(pool)
            .await
            .unwrap();
    }

    pub async fn insert_dish(pool: &SqlitePool, id: i64, client_id: i64, name: &str, pictures: &str) {
        sqlx::query("INSERT INTO dish (id, client_id, name, price, pictures) VALUES (?, ?, ?, 9.5, ?)")
            .bind(id)
            .bind(client_id)
            .bind(name)
            .bind(pictures)
            .execute(pool)
            .await
            .unwrap();
    }

    pub async fn insert_ingredient(pool: &SqlitePool, id: i64, dish_id: i64, name: &str) {
        sqlx::query("INSERT INTO ingredient (id, dish_id, name, active, price) VALUES (?, ?, ?, 1, 0.5)")
            .bind(id)
            .bind(dish_id)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_maps_to_app_error_codes() {
        let cases = [
            (RepoError::NotFound("Order 1".into()), ErrorCode::NotFound),
            (RepoError::RequiredField("dish_id".into()), ErrorCode::RequiredField),
            (RepoError::InsertFailed("x".into()), ErrorCode::InsertFailed),
            (RepoError::UpdateFailed("x".into()), ErrorCode::UpdateFailed),
            (RepoError::Validation("x".into()), ErrorCode::ValidationFailed),
            (RepoError::Database("x".into()), ErrorCode::DatabaseError),
        ];
        for (repo, code) in cases {
            assert_eq!(AppError::from(repo).code, code);
        }
    }

    #[test]
    fn test_sqlx_error_text_is_not_exposed() {
        let err = RepoError::from(sqlx::Error::Protocol("near \"SELEC\": syntax error".into()));
        let app = AppError::from(err);
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert_eq!(app.message, "Database query failed");
    }
}
