// ==========================================
// Système Qualité Laboratoire - Règles d'acceptation
// ==========================================
// Règles de seuil configurées, règles de zone environnementale,
// table de conversion UFC, et l'instantané immuable passé au moteur
// ==========================================
// Règle d'or: l'instantané n'est jamais modifié pendant une passe
// de résolution
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ThresholdRule - Règle de seuil configurée
// ==========================================
/// Règle dynamique saisie par les administrateurs qualité
///
/// Portée: (site ou joker, famille de produit, clé canonique d'analyse).
/// `site = None` vaut pour tous les sites; une règle de site exact prime
/// sur la règle joker pour la même clé
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub rule_id: String,
    /// None = tous sites (joker)
    pub site: Option<String>,
    pub product_family: String,
    /// Clé canonique d'analyse (cible des clés candidates du normaliseur)
    pub analyte: String,
    /// Opérateur brut tel que stocké ("<", "<=", ">", ">=", "=", "between");
    /// un opérateur inconnu est traité comme absence de règle, jamais deviné
    pub operator: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub active: bool,
}

// ==========================================
// ZoneRule - Règle de zone environnementale
// ==========================================
/// Espace de règles disjoint pour les prélèvements d'air ("Air Statique")
///
/// Clé: (site ou joker, nom d'emplacement). Le volume de prélèvement sert
/// à la conversion UFC avant comparaison au seuil
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRule {
    pub rule_id: String,
    /// None = tous sites (joker)
    pub site: Option<String>,
    /// Nom d'emplacement (porté par le champ product_type de l'échantillon)
    pub location_name: String,
    /// Libellé de zone (ex: "Zone A - conditionnement")
    pub zone: String,
    /// Volume de prélèvement nominal en mL (100 / 250 / 500)
    pub sample_volume_ml: i64,
    pub operator: String,
    pub bound: f64,
    pub active: bool,
}

// ==========================================
// UfcConversionRow - Ligne de conversion UFC
// ==========================================
/// Conversion comptage brut -> UFC/g selon le volume de prélèvement
///
/// La correspondance se fait sur le comptage brut EXACT; en l'absence de
/// ligne ou de colonne de volume, le convertisseur dégrade en renvoyant
/// le comptage brut inchangé (avertissement non bloquant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UfcConversionRow {
    pub raw_count: i64,
    pub ufc_100ml: f64,
    pub ufc_250ml: f64,
    pub ufc_500ml: f64,
}

impl UfcConversionRow {
    /// Valeur UFC/g pour un volume de référence
    ///
    /// # Retour
    /// - Some(f64): volume supporté (100/250/500 mL)
    /// - None: volume hors table
    pub fn ufc_for_volume(&self, volume_ml: i64) -> Option<f64> {
        match volume_ml {
            100 => Some(self.ufc_100ml),
            250 => Some(self.ufc_250ml),
            500 => Some(self.ufc_500ml),
            _ => None,
        }
    }
}

// ==========================================
// RuleSnapshot - Instantané de règles
// ==========================================
/// Paquet immuable de toutes les collections de règles + table de
/// conversion, construit une fois par passe d'évaluation ou de recalcul
///
/// Remplace les caches mutables historiquement portés par les écrans:
/// l'instantané est construit par le SnapshotLoader puis passé
/// explicitement au résolveur et à l'agrégateur
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    threshold_rules: Vec<ThresholdRule>,
    zone_rules: Vec<ZoneRule>,
    ufc_rows: Vec<UfcConversionRow>,
}

impl RuleSnapshot {
    pub fn new(
        threshold_rules: Vec<ThresholdRule>,
        zone_rules: Vec<ZoneRule>,
        ufc_rows: Vec<UfcConversionRow>,
    ) -> Self {
        Self {
            threshold_rules,
            zone_rules,
            ufc_rows,
        }
    }

    /// Règles de seuil actives pour une famille de produit
    pub fn threshold_rules_for_family<'a>(
        &'a self,
        product_family: &'a str,
    ) -> impl Iterator<Item = &'a ThresholdRule> {
        self.threshold_rules
            .iter()
            .filter(move |r| r.active && r.product_family == product_family)
    }

    /// Règles de zone actives
    pub fn zone_rules(&self) -> impl Iterator<Item = &ZoneRule> {
        self.zone_rules.iter().filter(|r| r.active)
    }

    /// Ligne de conversion pour un comptage brut exact
    pub fn ufc_row(&self, raw_count: i64) -> Option<&UfcConversionRow> {
        self.ufc_rows.iter().find(|r| r.raw_count == raw_count)
    }

    pub fn threshold_rule_count(&self) -> usize {
        self.threshold_rules.len()
    }

    pub fn zone_rule_count(&self) -> usize {
        self.zone_rules.len()
    }

    pub fn ufc_row_count(&self) -> usize {
        self.ufc_rows.len()
    }
}
