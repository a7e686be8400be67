// ==========================================
// Système Qualité Laboratoire - Comparateur de seuil
// ==========================================
// Fonctions pures: évaluation d'un couple opérateur/borne contre une
// valeur mesurée
// Règle d'or: sans état, sans effet de bord, sans I/O
// ==========================================

use crate::domain::types::{AnalyteStatus, Operator};

// ==========================================
// Comparator - Fonctions pures de comparaison
// ==========================================
pub struct Comparator;

impl Comparator {
    /// Évalue une valeur mesurée contre un opérateur et ses bornes
    ///
    /// # Règles
    /// - `<`  : valeur < borne haute
    /// - `<=` : valeur <= borne haute
    /// - `>`  : valeur > borne basse
    /// - `>=` : valeur >= borne basse
    /// - `=`  : valeur == borne; borne 0 = exigence d'absence totale
    ///   de l'organisme (même sémantique, origine métier distincte)
    /// - `between` : borne basse <= valeur <= borne haute
    /// - opérateur inconnu ou borne requise absente => SANS_REGLE
    ///
    /// # Paramètres
    /// - operator: opérateur brut tel que stocké
    /// - lower_bound: borne basse (selon opérateur)
    /// - upper_bound: borne haute (selon opérateur)
    /// - value: valeur mesurée
    ///
    /// # Retour
    /// - AnalyteStatus: Valid / Invalid / NoRule
    pub fn evaluate(
        operator: &str,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
        value: f64,
    ) -> AnalyteStatus {
        let Some(op) = Operator::parse(operator) else {
            // Opérateur non supporté: jamais deviné
            return AnalyteStatus::NoRule;
        };

        match op {
            Operator::Lt => match upper_bound {
                Some(upper) => Self::status(value < upper),
                None => AnalyteStatus::NoRule,
            },
            Operator::Le => match upper_bound {
                Some(upper) => Self::status(value <= upper),
                None => AnalyteStatus::NoRule,
            },
            Operator::Gt => match lower_bound {
                Some(lower) => Self::status(value > lower),
                None => AnalyteStatus::NoRule,
            },
            Operator::Ge => match lower_bound {
                Some(lower) => Self::status(value >= lower),
                None => AnalyteStatus::NoRule,
            },
            Operator::Eq => match upper_bound.or(lower_bound) {
                // borne 0: exigence d'absence (valeur == 0)
                Some(bound) => Self::status(value == bound),
                None => AnalyteStatus::NoRule,
            },
            Operator::Between => match (lower_bound, upper_bound) {
                (Some(lower), Some(upper)) => Self::status(lower <= value && value <= upper),
                _ => AnalyteStatus::NoRule,
            },
        }
    }

    fn status(ok: bool) -> AnalyteStatus {
        if ok {
            AnalyteStatus::Valid
        } else {
            AnalyteStatus::Invalid
        }
    }
}
