// ==========================================
// Système Qualité Laboratoire - Modèle du domaine
// ==========================================
// Entités, types et charges utiles; aucune logique d'accès aux
// données ni logique moteur ici
// ==========================================

pub mod alert;
pub mod rule;
pub mod sample;
pub mod types;

// Réexport des types centraux
pub use alert::{NonConformityAlert, NonConformitySample};
pub use rule::{RuleSnapshot, ThresholdRule, UfcConversionRow, ZoneRule};
pub use sample::{AnalyteAssignment, Sample};
pub use types::{AnalyteStatus, AssignmentStatus, Operator, RuleSource, ShelfStage, Verdict};
