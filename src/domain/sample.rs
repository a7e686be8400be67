// ==========================================
// Système Qualité Laboratoire - Échantillons
// ==========================================
// Entités: échantillon de laboratoire + affectation d'analyses par fiche
// Le moteur lit les mesures et produit le verdict; le cycle de vie
// de l'échantillon appartient à la couche de persistance
// ==========================================

use crate::domain::types::{AssignmentStatus, ShelfStage, Verdict};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Sample - Échantillon de laboratoire
// ==========================================
/// Échantillon saisi par le laboratoire
///
/// Les mesures sont conservées sous forme brute (texte saisi à l'écran,
/// virgule décimale possible); le moteur de conformité fait lui-même le
/// parsing et journalise les valeurs illisibles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Identifiant technique
    pub sample_id: String,
    /// Numéro d'échantillon affiché (ex: "2026-08-0153")
    pub sample_no: String,
    /// Fiche de saisie d'origine (porte la liste d'analyses affectées)
    pub form_id: String,
    /// Site de production
    pub site: String,
    /// Famille de produit (marque); "Air Statique" pour les prélèvements d'air
    pub product_family: String,
    /// Type de produit; pour "Air Statique" ce champ porte le nom d'emplacement
    pub product_type: String,
    /// Marqueur AJ/DLC (contexte de la surcharge fromage pasteurisé)
    pub shelf_stage: Option<ShelfStage>,
    /// pH saisi (physico-chimique, hors verdict)
    pub ph_raw: Option<String>,
    /// Acidité saisie (physico-chimique, hors verdict)
    pub acidity_raw: Option<String>,
    /// Mesures brutes par libellé d'analyse
    pub measurements: BTreeMap<String, String>,
    /// Verdict persisté (None tant qu'aucun calcul n'a été enregistré)
    pub verdict: Option<Verdict>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Sample {
    /// Mesure brute pour un libellé d'analyse
    pub fn measurement(&self, analyte: &str) -> Option<&str> {
        self.measurements.get(analyte).map(|s| s.as_str())
    }
}

// ==========================================
// AnalyteAssignment - Affectation d'analyse
// ==========================================
/// Analyse suivie pour les échantillons d'une fiche
///
/// Le statut est positionné par les écrans de saisie à l'enregistrement
/// d'une mesure; le moteur ne s'en sert que pour connaître les analyses
/// à évaluer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyteAssignment {
    pub form_id: String,
    /// Libellé d'analyse tel que saisi (passe par le normaliseur)
    pub analyte: String,
    pub status: AssignmentStatus,
}
