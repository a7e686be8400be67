// ==========================================
// Système Qualité Laboratoire - Agrégateur de conformité
// ==========================================
// Pour un échantillon et ses analyses affectées, produit le statut par
// analyse et le verdict échantillon
// Règle d'or: toute évaluation sort une raison lisible
// ==========================================
// Le verdict est une fonction pure des statuts d'analyses
// microbiologiques: les mesures organoleptiques/physico-chimiques
// (odeur, texture, pH, acidité) sont évaluées et colorées à l'écran
// mais n'alimentent JAMAIS le verdict (comportement métier assumé)
// ==========================================

use crate::domain::rule::RuleSnapshot;
use crate::domain::sample::{AnalyteAssignment, Sample};
use crate::domain::types::{AnalyteStatus, RuleSource, Verdict};
use crate::engine::comparator::Comparator;
use crate::engine::converter::UfcConverter;
use crate::engine::normalizer::NameNormalizer;
use crate::engine::resolver::{ResolvedRule, RuleResolver};
use serde::{Deserialize, Serialize};

// Analyses organoleptiques / physico-chimiques, hors verdict
const ORGANOLEPTIC_ANALYTES: [&str; 7] = [
    "ph", "acidité", "acidite", "odeur", "texture", "goût", "aspect",
];

// ==========================================
// AnalyteEvaluation - Évaluation d'une analyse
// ==========================================
/// Statut d'une analyse pour un échantillon, avec valeur retenue,
/// provenance de la règle et raison lisible (coloration des cellules
/// à l'écran et lignes d'alerte)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyteEvaluation {
    pub analyte: String,
    pub raw_value: String,
    /// Valeur numérique lue (None si illisible)
    pub parsed_value: Option<f64>,
    /// Valeur UFC/g après conversion (prélèvements d'air uniquement)
    pub converted_value: Option<f64>,
    pub status: AnalyteStatus,
    pub source: Option<RuleSource>,
    /// Analyse organoleptique/physico-chimique: colorée mais hors verdict
    pub organoleptic: bool,
    pub reason: String,
}

// ==========================================
// SampleEvaluation - Évaluation d'un échantillon
// ==========================================
/// Résultat complet d'une évaluation: verdict recalculé, verdict
/// persisté (détection de dérive) et détail par analyse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleEvaluation {
    pub sample_id: String,
    pub sample_no: String,
    /// Verdict recalculé depuis les mesures courantes
    pub fresh_verdict: Verdict,
    /// Verdict enregistré en base au moment de l'évaluation
    pub persisted_verdict: Option<Verdict>,
    pub analytes: Vec<AnalyteEvaluation>,
}

impl SampleEvaluation {
    /// Le verdict persisté diverge-t-il du verdict recalculé
    pub fn has_drift(&self) -> bool {
        self.persisted_verdict != Some(self.fresh_verdict)
    }

    /// Raisons de non-conformité (analyses microbiologiques hors seuil)
    pub fn nonconformity_reasons(&self) -> Vec<String> {
        self.analytes
            .iter()
            .filter(|a| !a.organoleptic && a.status == AnalyteStatus::Invalid)
            .map(|a| a.reason.clone())
            .collect()
    }
}

// ==========================================
// ConformityEngine - Agrégateur de conformité
// ==========================================
pub struct ConformityEngine;

impl ConformityEngine {
    /// Évalue un échantillon contre l'instantané de règles
    ///
    /// # Règles
    /// 1. chaque analyse affectée avec une mesure numérique est résolue
    ///    (conversion UFC d'abord quand elle s'applique)
    /// 2. une mesure absente est ignorée; une mesure illisible est
    ///    ignorée pour le verdict et journalisée en avertissement
    /// 3. une seule analyse microbiologique hors seuil => Non-conforme
    /// 4. aucune analyse affectée => Conforme par défaut
    /// 5. le verdict persisté n'est jamais réutilisé: recalcul complet
    ///
    /// # Paramètres
    /// - snapshot: instantané immuable des règles
    /// - sample: échantillon à évaluer
    /// - assignments: analyses affectées à la fiche de l'échantillon
    ///
    /// # Retour
    /// - SampleEvaluation: verdict recalculé + verdict persisté + détail
    pub fn evaluate(
        snapshot: &RuleSnapshot,
        sample: &Sample,
        assignments: &[AnalyteAssignment],
    ) -> SampleEvaluation {
        let mut evaluations: Vec<AnalyteEvaluation> = Vec::new();

        for assignment in assignments {
            let analyte = assignment.analyte.as_str();
            let Some(raw) = Self::measurement_for(sample, analyte) else {
                // Mesure absente: ni valide ni invalide
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let organoleptic = Self::is_organoleptic(analyte);

            // Saisie française: la virgule décimale est acceptée
            let Ok(value) = raw.replace(',', ".").parse::<f64>() else {
                tracing::warn!(
                    sample_no = %sample.sample_no,
                    analyte = %analyte,
                    valeur = %raw,
                    "Mesure illisible, analyse ignorée pour le verdict"
                );
                evaluations.push(AnalyteEvaluation {
                    analyte: analyte.to_string(),
                    raw_value: raw.to_string(),
                    parsed_value: None,
                    converted_value: None,
                    status: AnalyteStatus::NoRule,
                    source: None,
                    organoleptic,
                    reason: format!("{}: valeur illisible \"{}\"", analyte, raw),
                });
                continue;
            };

            let resolved = RuleResolver::resolve(
                snapshot,
                &sample.site,
                &sample.product_family,
                &sample.product_type,
                analyte,
                sample.shelf_stage,
            );

            let evaluation = match resolved {
                Some(rule) => Self::evaluate_against_rule(
                    snapshot, sample, analyte, raw, value, organoleptic, &rule,
                ),
                None => AnalyteEvaluation {
                    analyte: analyte.to_string(),
                    raw_value: raw.to_string(),
                    parsed_value: Some(value),
                    converted_value: None,
                    status: AnalyteStatus::NoRule,
                    source: None,
                    organoleptic,
                    reason: format!("{}: aucune règle applicable", analyte),
                },
            };
            evaluations.push(evaluation);
        }

        // Verdict: fonction pure des statuts microbiologiques
        let fresh_verdict = if evaluations
            .iter()
            .any(|e| !e.organoleptic && e.status == AnalyteStatus::Invalid)
        {
            Verdict::NonConforme
        } else {
            Verdict::Conforme
        };

        SampleEvaluation {
            sample_id: sample.sample_id.clone(),
            sample_no: sample.sample_no.clone(),
            fresh_verdict,
            persisted_verdict: sample.verdict,
            analytes: evaluations,
        }
    }

    /// Évalue une valeur contre la règle résolue (conversion UFC incluse)
    fn evaluate_against_rule(
        snapshot: &RuleSnapshot,
        sample: &Sample,
        analyte: &str,
        raw: &str,
        value: f64,
        organoleptic: bool,
        rule: &ResolvedRule,
    ) -> AnalyteEvaluation {
        // Conversion UFC: levures/moisissures sur prélèvement d'air,
        // avant comparaison au seuil de zone
        let (effective_value, converted_value) = match rule.sample_volume_ml {
            Some(volume_ml) if NameNormalizer::is_yeast_mold(analyte) => {
                let outcome = UfcConverter::convert(snapshot, value, volume_ml);
                if outcome.degraded {
                    tracing::warn!(
                        sample_no = %sample.sample_no,
                        analyte = %analyte,
                        comptage = value,
                        volume_ml,
                        "Ligne de conversion UFC absente, comptage brut conservé"
                    );
                }
                (outcome.ufc_per_g, Some(outcome.ufc_per_g))
            }
            _ => (value, None),
        };

        let status = Comparator::evaluate(
            &rule.operator,
            rule.lower_bound,
            rule.upper_bound,
            effective_value,
        );

        let reason = match status {
            AnalyteStatus::Valid => format!(
                "{}: {} dans le seuil {} ({})",
                analyte,
                effective_value,
                Self::describe_bounds(rule),
                Self::source_label(rule.source),
            ),
            AnalyteStatus::Invalid => format!(
                "{}: {} hors seuil {} ({})",
                analyte,
                effective_value,
                Self::describe_bounds(rule),
                Self::source_label(rule.source),
            ),
            AnalyteStatus::NoRule => {
                format!("{}: opérateur de règle non supporté, analyse non contrainte", analyte)
            }
        };

        AnalyteEvaluation {
            analyte: analyte.to_string(),
            raw_value: raw.to_string(),
            parsed_value: Some(value),
            converted_value,
            status,
            source: Some(rule.source),
            organoleptic,
            reason,
        }
    }

    /// Mesure brute d'une analyse; pH et acidité sont portés par leurs
    /// colonnes dédiées quand ils manquent dans la grille de mesures
    fn measurement_for<'a>(sample: &'a Sample, analyte: &str) -> Option<&'a str> {
        if let Some(raw) = sample.measurement(analyte) {
            return Some(raw);
        }
        let folded = NameNormalizer::fold(analyte);
        match folded.as_str() {
            "ph" => sample.ph_raw.as_deref(),
            "acidité" | "acidite" => sample.acidity_raw.as_deref(),
            _ => None,
        }
    }

    /// L'analyse est-elle organoleptique / physico-chimique
    pub fn is_organoleptic(analyte: &str) -> bool {
        let folded = NameNormalizer::fold(analyte);
        ORGANOLEPTIC_ANALYTES.iter().any(|a| folded == *a)
    }

    fn describe_bounds(rule: &ResolvedRule) -> String {
        match (rule.lower_bound, rule.upper_bound) {
            (Some(lower), Some(upper)) if rule.operator == "between" => {
                format!("entre {} et {}", lower, upper)
            }
            (_, Some(upper)) => format!("{} {}", rule.operator, upper),
            (Some(lower), _) => format!("{} {}", rule.operator, lower),
            _ => rule.operator.clone(),
        }
    }

    fn source_label(source: RuleSource) -> &'static str {
        match source {
            RuleSource::ContextOverride => "surcharge DLC",
            RuleSource::Zone => "règle de zone",
            RuleSource::Dynamic => "règle dynamique",
            RuleSource::Fallback => "table de repli",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{ThresholdRule, UfcConversionRow, ZoneRule};
    use crate::domain::types::{AssignmentStatus, ShelfStage};
    use chrono::NaiveDate;

    fn sample(family: &str, product_type: &str, measurements: &[(&str, &str)]) -> Sample {
        let ts = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Sample {
            sample_id: "S001".to_string(),
            sample_no: "2026-08-0001".to_string(),
            form_id: "F001".to_string(),
            site: "Laval".to_string(),
            product_family: family.to_string(),
            product_type: product_type.to_string(),
            shelf_stage: None,
            ph_raw: None,
            acidity_raw: None,
            measurements: measurements
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            verdict: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn assignments(form_id: &str, analytes: &[&str]) -> Vec<AnalyteAssignment> {
        analytes
            .iter()
            .map(|a| AnalyteAssignment {
                form_id: form_id.to_string(),
                analyte: a.to_string(),
                status: AssignmentStatus::Completed,
            })
            .collect()
    }

    // ==========================================
    // Test 1: verdict par défaut et agrégation
    // ==========================================

    #[test]
    fn test_no_assignments_is_conforme() {
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &sample("GYMA 0%", "Pot 500g", &[("Entérobactéries", "999")]),
            &[],
        );
        assert_eq!(result.fresh_verdict, Verdict::Conforme);
        assert!(result.analytes.is_empty());
    }

    #[test]
    fn test_single_invalid_analyte_is_non_conforme() {
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &sample(
                "GYMA 0%",
                "Pot 500g",
                &[("Entérobactéries", "25"), ("Coliformes totaux", "2")],
            ),
            &assignments("F001", &["Entérobactéries", "Coliformes totaux"]),
        );
        assert_eq!(result.fresh_verdict, Verdict::NonConforme);
        let reasons = result.nonconformity_reasons();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("Entérobactéries"));
    }

    #[test]
    fn test_no_rule_status_never_counts_as_nonconforming() {
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &sample("GYMA 0%", "Pot 500g", &[("Listeria monocytogenes", "9000")]),
            &assignments("F001", &["Listeria monocytogenes"]),
        );
        assert_eq!(result.analytes[0].status, AnalyteStatus::NoRule);
        assert_eq!(result.fresh_verdict, Verdict::Conforme);
    }

    // ==========================================
    // Test 2: mesures absentes et illisibles
    // ==========================================

    #[test]
    fn test_missing_measurement_is_skipped() {
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &sample("GYMA 0%", "Pot 500g", &[]),
            &assignments("F001", &["Entérobactéries"]),
        );
        assert!(result.analytes.is_empty());
        assert_eq!(result.fresh_verdict, Verdict::Conforme);
    }

    #[test]
    fn test_malformed_measurement_is_logged_not_counted() {
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &sample("GYMA 0%", "Pot 500g", &[("Entérobactéries", "absente")]),
            &assignments("F001", &["Entérobactéries"]),
        );
        assert_eq!(result.analytes.len(), 1);
        assert_eq!(result.analytes[0].status, AnalyteStatus::NoRule);
        assert!(result.analytes[0].reason.contains("illisible"));
        assert_eq!(result.fresh_verdict, Verdict::Conforme);
    }

    #[test]
    fn test_decimal_comma_is_parsed() {
        let snapshot = RuleSnapshot::new(
            vec![ThresholdRule {
                rule_id: "R1".to_string(),
                site: None,
                product_family: "GYMA 0%".to_string(),
                analyte: "Acidité".to_string(),
                operator: "between".to_string(),
                lower_bound: Some(0.6),
                upper_bound: Some(0.9),
                active: true,
            }],
            vec![],
            vec![],
        );
        let result = ConformityEngine::evaluate(
            &snapshot,
            &sample("GYMA 0%", "Pot 500g", &[("Acidité", "0,75")]),
            &assignments("F001", &["Acidité"]),
        );
        assert_eq!(result.analytes[0].parsed_value, Some(0.75));
        assert_eq!(result.analytes[0].status, AnalyteStatus::Valid);
    }

    // ==========================================
    // Test 3: exclusion organoleptique du verdict
    // ==========================================

    #[test]
    fn test_invalid_ph_is_flagged_but_excluded_from_verdict() {
        let snapshot = RuleSnapshot::new(
            vec![ThresholdRule {
                rule_id: "R1".to_string(),
                site: None,
                product_family: "GYMA 0%".to_string(),
                analyte: "pH".to_string(),
                operator: "between".to_string(),
                lower_bound: Some(4.4),
                upper_bound: Some(4.8),
                active: true,
            }],
            vec![],
            vec![],
        );
        let mut s = sample("GYMA 0%", "Pot 500g", &[]);
        s.ph_raw = Some("5.6".to_string());

        let result =
            ConformityEngine::evaluate(&snapshot, &s, &assignments("F001", &["pH"]));
        assert_eq!(result.analytes[0].status, AnalyteStatus::Invalid);
        assert!(result.analytes[0].organoleptic);
        // Hors seuil à l'écran, mais le verdict reste Conforme
        assert_eq!(result.fresh_verdict, Verdict::Conforme);
    }

    // ==========================================
    // Test 4: surcharge DLC de bout en bout
    // ==========================================

    #[test]
    fn test_dlc_override_boundary_values() {
        let mut s = sample(
            "Fromage Pasteurisé",
            "Portion 200g",
            &[("Levures/Moisissures", "50000")],
        );
        s.shelf_stage = Some(ShelfStage::Dlc);

        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &s,
            &assignments("F001", &["Levures/Moisissures"]),
        );
        assert_eq!(result.analytes[0].status, AnalyteStatus::Valid);
        assert_eq!(result.fresh_verdict, Verdict::Conforme);

        s.measurements
            .insert("Levures/Moisissures".to_string(), "50001".to_string());
        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &s,
            &assignments("F001", &["Levures/Moisissures"]),
        );
        assert_eq!(result.analytes[0].status, AnalyteStatus::Invalid);
        assert_eq!(result.fresh_verdict, Verdict::NonConforme);
    }

    // ==========================================
    // Test 5: chemin environnemental avec conversion UFC
    // ==========================================

    #[test]
    fn test_air_statique_converts_before_zone_bound() {
        let snapshot = RuleSnapshot::new(
            vec![],
            vec![ZoneRule {
                rule_id: "Z1".to_string(),
                site: None,
                location_name: "Salle blanche".to_string(),
                zone: "Zone A".to_string(),
                sample_volume_ml: 250,
                operator: "<".to_string(),
                bound: 10.0,
                active: true,
            }],
            vec![UfcConversionRow {
                raw_count: 3,
                ufc_100ml: 36.0,
                ufc_250ml: 14.0,
                ufc_500ml: 7.0,
            }],
        );

        let result = ConformityEngine::evaluate(
            &snapshot,
            &sample("Air Statique", "Salle blanche", &[("Levures/Moisissures", "3")]),
            &assignments("F001", &["Levures/Moisissures"]),
        );
        // 3 colonies -> 14 UFC/g à 250 mL, comparé au seuil < 10
        assert_eq!(result.analytes[0].converted_value, Some(14.0));
        assert_eq!(result.analytes[0].status, AnalyteStatus::Invalid);
        assert_eq!(result.fresh_verdict, Verdict::NonConforme);
    }

    #[test]
    fn test_drift_detection_against_persisted_verdict() {
        let mut s = sample("GYMA 0%", "Pot 500g", &[("Entérobactéries", "25")]);
        s.verdict = Some(Verdict::Conforme);

        let result = ConformityEngine::evaluate(
            &RuleSnapshot::default(),
            &s,
            &assignments("F001", &["Entérobactéries"]),
        );
        assert_eq!(result.fresh_verdict, Verdict::NonConforme);
        assert_eq!(result.persisted_verdict, Some(Verdict::Conforme));
        assert!(result.has_drift());
    }
}
