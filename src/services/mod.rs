pub mod organization_service;
pub mod property_service;
pub mod question_bank_service;
pub mod question_service;
pub mod survey_service;

pub use organization_service::OrganizationServiceImpl;
pub use property_service::PropertyServiceImpl;
pub use question_bank_service::QuestionBankServiceImpl;
pub use question_service::QuestionServiceImpl;
pub use survey_service::SurveyServiceImpl;

use crate::error::{AppError, AppResult};

pub(crate) fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// Like `require`, for fields of a partial update that may be absent.
pub(crate) fn require_if_present(field: &str, value: Option<&str>) -> AppResult<()> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}

/// Maps a foreign key violation to a 400 naming the missing parent.
pub(crate) fn map_reference_error(e: sqlx::Error, parent: &str) -> AppError {
    let is_fk = e
        .as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false);
    if is_fk {
        AppError::InvalidInput(format!("Referenced {} does not exist", parent))
    } else {
        AppError::Database(e)
    }
}
