// ==========================================
// Système Qualité Laboratoire - Erreurs de la couche persistance
// ==========================================
// Outil: macro dérivée thiserror
// ==========================================

use thiserror::Error;

/// Erreurs de la couche persistance
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== Erreurs base de données =====
    #[error("Enregistrement introuvable: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("Connexion base de données impossible: {0}")]
    DatabaseConnectionError(String),

    #[error("Verrou base de données indisponible: {0}")]
    LockError(String),

    #[error("Transaction base de données échouée: {0}")]
    DatabaseTransactionError(String),

    #[error("Requête base de données échouée: {0}")]
    DatabaseQueryError(String),

    #[error("Contrainte d'unicité violée: {0}")]
    UniqueConstraintViolation(String),

    #[error("Contrainte de clé étrangère violée: {0}")]
    ForeignKeyViolation(String),

    // ===== Erreurs de qualité de données =====
    #[error("Validation échouée: {0}")]
    ValidationError(String),

    #[error("Valeur de champ invalide (champ={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== Erreurs génériques =====
    #[error("Erreur interne: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Conversion depuis rusqlite::Error
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Alias de Result pour la couche persistance
pub type RepositoryResult<T> = Result<T, RepositoryError>;
