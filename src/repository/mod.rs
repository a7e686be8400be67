// ==========================================
// Système Qualité Laboratoire - Couche persistance
// ==========================================
// Règle d'or: le repository ne porte aucune logique métier
// Contrainte: toutes les requêtes sont paramétrées (pas d'injection SQL)
// ==========================================

pub mod assignment_repo;
pub mod error;
pub mod rule_repo;
pub mod sample_repo;
pub mod snapshot;

// Réexport des repositories centraux
pub use assignment_repo::AnalyteAssignmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use rule_repo::{ThresholdRuleRepository, UfcConversionRepository, ZoneRuleRepository};
pub use sample_repo::SampleRepository;
pub use snapshot::SnapshotLoader;
