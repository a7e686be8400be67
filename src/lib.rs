// ==========================================
// Système Qualité Laboratoire - Bibliothèque centrale
// ==========================================
// Pile technique: Rust + SQLite
// Positionnement: cœur applicatif du contrôle qualité (les écrans,
// l'export Excel et l'authentification vivent au-dessus)
// ==========================================

// ==========================================
// Déclaration des modules
// ==========================================

// Couche domaine - entités et types
pub mod domain;

// Couche persistance - accès aux données
pub mod repository;

// Couche moteur - règles métier de conformité
pub mod engine;

// Couche configuration
pub mod config;

// Infrastructure base de données (connexion / PRAGMA unifiés / schéma)
pub mod db;

// Journalisation
pub mod logging;

// Couche API - interfaces métier
pub mod api;

// ==========================================
// Réexport des types centraux
// ==========================================

// Types du domaine
pub use domain::types::{
    AnalyteStatus, AssignmentStatus, Operator, RuleSource, ShelfStage, Verdict,
};

// Entités du domaine
pub use domain::{
    AnalyteAssignment, NonConformityAlert, NonConformitySample, RuleSnapshot, Sample,
    ThresholdRule, UfcConversionRow, ZoneRule,
};

// Moteurs
pub use engine::{
    Comparator, ConformityEngine, FallbackTable, NameNormalizer, RecomputeEngine,
    RecomputeReport, RuleResolver, SampleEvaluation, UfcConverter,
};

// API
pub use api::QualityApi;

// ==========================================
// Constantes système
// ==========================================

// Version du système
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Nom du système
pub const APP_NAME: &str = "Système Qualité Laboratoire";

// Version de base de données
pub const DB_VERSION: &str = "v0.1";
