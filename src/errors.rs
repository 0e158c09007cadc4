// ============================================================================
// ERREURS DE L'APPLICATION
// ============================================================================
//
// Description:
//   Type d'erreur unique partagé par les services et les routes.
//   Implémente ResponseError pour que les routes puissent utiliser `?`.
//
// Correspondance HTTP:
//   - Validation  → 400 {"error": "Validation failed", "fields": {...}}
//   - NotFound    → 404 {"error": "Not found"}
//   - Unauthorized → 401
//   - Conflict    → 409
//   - le reste    → 500 {"error": "Internal server error"} (loggé)
//
// Points d'attention:
//   - NotFound ne dit jamais si la ligne existe chez un autre utilisateur
//
// ============================================================================

use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Erreur de validation sur un seul champ
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.into());
        AppError::Validation(fields)
    }

    /// Transforme une violation d'unicité en erreur de validation sur `field`.
    /// Les autres erreurs SQL restent des erreurs de base de données.
    pub fn unique_violation(err: DbErr, field: &str, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::validation(field, message),
            _ => AppError::Database(err),
        }
    }

    /// Violation d'unicité → 409 (ex.: deux inscriptions simultanées)
    pub fn unique_conflict(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .unwrap_or_else(|| "invalid".to_string());
                (field.to_string(), message)
            })
            .collect();
        AppError::Validation(fields)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(fields) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation failed",
                "fields": fields
            })),
            AppError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "Not found"
            })),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": msg
            })),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(serde_json::json!({
                "error": msg
            })),
            other => {
                tracing::error!("Request failed: {}", other);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}
