//! Tenant passport repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::{DocumentKind, Passport, PassportDocument};

#[async_trait]
pub trait PassportRepository: Send + Sync {
    async fn get_for_user(&self, user_id: i64) -> Result<Option<Passport>>;

    /// Create an empty passport; the UNIQUE(user_id) constraint guards
    /// against doubles
    async fn create_for_user(&self, user_id: i64) -> Result<Passport>;

    /// Set one document flag and recompute progress/completed
    async fn set_document_flag(&self, passport_id: i64, kind: DocumentKind) -> Result<Passport>;

    async fn add_document(
        &self,
        passport_id: i64,
        kind: DocumentKind,
        file_url: &str,
    ) -> Result<PassportDocument>;

    async fn list_documents(&self, passport_id: i64) -> Result<Vec<PassportDocument>>;
}

pub struct SqlxPassportRepository {
    executor: QueryExecutor,
}

impl SqlxPassportRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn PassportRepository> {
        Arc::new(Self::new(executor))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Passport>> {
        let row = self
            .executor
            .fetch_optional(&format!("{} WHERE id = ?", SELECT_PASSPORT), &[id.into()])
            .await
            .context("Failed to get passport")?;
        Ok(row.map(|row| row_to_passport(&row)))
    }
}

#[async_trait]
impl PassportRepository for SqlxPassportRepository {
    async fn get_for_user(&self, user_id: i64) -> Result<Option<Passport>> {
        let row = self
            .executor
            .fetch_optional(
                &format!("{} WHERE user_id = ?", SELECT_PASSPORT),
                &[user_id.into()],
            )
            .await
            .context("Failed to get passport")?;
        Ok(row.map(|row| row_to_passport(&row)))
    }

    async fn create_for_user(&self, user_id: i64) -> Result<Passport> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                "INSERT INTO passports (user_id, created_at, updated_at) VALUES (?, ?, ?)",
                &[user_id.into(), now.into(), now.into()],
            )
            .await
            .context("Failed to create passport")?;

        self.get_by_id(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Passport not found after insert"))
    }

    async fn set_document_flag(&self, passport_id: i64, kind: DocumentKind) -> Result<Passport> {
        let column = match kind {
            DocumentKind::Identity => "has_identity",
            DocumentKind::Solvency => "has_solvency",
            DocumentKind::Income => "has_income",
            DocumentKind::Other => "has_other",
        };

        self.executor
            .execute(
                &format!(
                    "UPDATE passports SET {} = 1, updated_at = ? WHERE id = ?",
                    column
                ),
                &[Utc::now().into(), passport_id.into()],
            )
            .await
            .context("Failed to set document flag")?;

        self.executor
            .execute(
                r#"
                UPDATE passports
                SET progress = (has_identity + has_solvency + has_income + has_other) * 25,
                    completed = (has_identity + has_solvency + has_income + has_other) = 4
                WHERE id = ?
                "#,
                &[passport_id.into()],
            )
            .await
            .context("Failed to recompute progress")?;

        self.get_by_id(passport_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Passport not found after update"))
    }

    async fn add_document(
        &self,
        passport_id: i64,
        kind: DocumentKind,
        file_url: &str,
    ) -> Result<PassportDocument> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                "INSERT INTO passport_documents (passport_id, kind, file_url, uploaded_at) VALUES (?, ?, ?, ?)",
                &[
                    passport_id.into(),
                    kind.to_string().into(),
                    file_url.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to add document")?;

        Ok(PassportDocument {
            id: result.last_insert_id,
            passport_id,
            kind,
            file_url: file_url.to_string(),
            uploaded_at: now,
        })
    }

    async fn list_documents(&self, passport_id: i64) -> Result<Vec<PassportDocument>> {
        let rows = self
            .executor
            .fetch_all(
                "SELECT id, passport_id, kind, file_url, uploaded_at FROM passport_documents WHERE passport_id = ? ORDER BY uploaded_at ASC",
                &[passport_id.into()],
            )
            .await
            .context("Failed to list documents")?;

        rows.iter().map(row_to_document).collect()
    }
}

const SELECT_PASSPORT: &str = r#"
    SELECT id, user_id, has_identity, has_solvency, has_income, has_other,
           progress, completed, created_at, updated_at
    FROM passports
"#;

fn row_to_passport(row: &SqliteRow) -> Passport {
    Passport {
        id: row.get("id"),
        user_id: row.get("user_id"),
        has_identity: row.get("has_identity"),
        has_solvency: row.get("has_solvency"),
        has_income: row.get("has_income"),
        has_other: row.get("has_other"),
        progress: row.get("progress"),
        completed: row.get("completed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_document(row: &SqliteRow) -> Result<PassportDocument> {
    let kind_str: String = row.get("kind");
    Ok(PassportDocument {
        id: row.get("id"),
        passport_id: row.get("passport_id"),
        kind: DocumentKind::from_str(&kind_str)
            .with_context(|| format!("Invalid document kind in database: {}", kind_str))?,
        file_url: row.get("file_url"),
        uploaded_at: row.get("uploaded_at"),
    })
}
