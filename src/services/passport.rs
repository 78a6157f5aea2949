//! Tenant passport service
//!
//! Each user has at most one passport. Uploading a document of a given
//! kind flips that kind's flag; progress is 25% per distinct kind and the
//! passport completes at 100%.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::PassportRepository;
use crate::models::passport::{DocumentKind, Passport, PassportDocument};

#[derive(Debug, thiserror::Error)]
pub enum PassportServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct PassportService {
    passport_repo: Arc<dyn PassportRepository>,
}

impl PassportService {
    pub fn new(passport_repo: Arc<dyn PassportRepository>) -> Self {
        Self { passport_repo }
    }

    /// Fetch the user's passport, creating an empty one on first access.
    pub async fn get_or_init(&self, user_id: i64) -> Result<Passport, PassportServiceError> {
        if let Some(passport) = self.passport_repo.get_for_user(user_id).await? {
            return Ok(passport);
        }
        let passport = self.passport_repo.create_for_user(user_id).await?;
        tracing::info!(user_id, "passport created");
        Ok(passport)
    }

    /// Attach a document and update the passport's progress. Re-uploading
    /// the same kind stores the new file but does not add progress.
    pub async fn add_document(
        &self,
        user_id: i64,
        kind: DocumentKind,
        file_url: &str,
    ) -> Result<Passport, PassportServiceError> {
        if file_url.trim().is_empty() {
            return Err(PassportServiceError::Validation(
                "File URL is required".into(),
            ));
        }

        let passport = self.get_or_init(user_id).await?;
        self.passport_repo
            .add_document(passport.id, kind, file_url)
            .await?;
        let updated = self.passport_repo.set_document_flag(passport.id, kind).await?;

        if updated.completed && !passport.completed {
            tracing::info!(user_id, "passport completed");
        }
        Ok(updated)
    }

    pub async fn documents(
        &self,
        user_id: i64,
    ) -> Result<Vec<PassportDocument>, PassportServiceError> {
        let passport = self.get_or_init(user_id).await?;
        Ok(self.passport_repo.list_documents(passport.id).await?)
    }
}
