// ==========================================
// Système Qualité Laboratoire - Couche moteur
// ==========================================
// Règles métier du contrôle de conformité microbiologique
// Règle d'or: le moteur ne fait pas de SQL, toute évaluation sort
// une raison lisible
// ==========================================

pub mod comparator;
pub mod conformity;
pub mod converter;
pub mod fallback;
pub mod normalizer;
pub mod notify;
pub mod recompute;
pub mod resolver;

// Réexport des moteurs centraux
pub use comparator::Comparator;
pub use conformity::{AnalyteEvaluation, ConformityEngine, SampleEvaluation};
pub use converter::{ConversionOutcome, UfcConverter};
pub use fallback::FallbackTable;
pub use normalizer::NameNormalizer;
pub use notify::{AlertNotifier, NoOpAlertNotifier, OptionalAlertNotifier};
pub use recompute::{RecomputeConfig, RecomputeEngine, RecomputeReport};
pub use resolver::{ResolvedRule, RuleResolver};
