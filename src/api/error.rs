// ==========================================
// Système Qualité Laboratoire - Erreurs de la couche API
// ==========================================
// Convertit les erreurs techniques de la persistance en messages
// compréhensibles par les écrans
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// Erreurs de la couche API
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Erreurs métier
    // ==========================================
    #[error("Entrée invalide: {0}")]
    InvalidInput(String),

    #[error("Ressource introuvable: {0}")]
    NotFound(String),

    // ==========================================
    // Erreurs d'accès aux données
    // ==========================================
    #[error("Erreur base de données: {0}")]
    DatabaseError(String),

    #[error("Connexion base de données impossible: {0}")]
    DatabaseConnectionError(String),

    #[error("Transaction base de données échouée: {0}")]
    DatabaseTransactionError(String),

    #[error("Validation échouée: {0}")]
    ValidationError(String),

    // ==========================================
    // Erreurs génériques
    // ==========================================
    #[error("Erreur interne: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// Conversion depuis RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={}) introuvable", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("Verrou indisponible: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("Contrainte d'unicité violée: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("Contrainte de clé étrangère violée: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("Champ {} invalide: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Alias de Result pour la couche API
pub type ApiResult<T> = Result<T, ApiError>;
