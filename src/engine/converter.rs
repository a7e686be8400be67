// ==========================================
// Système Qualité Laboratoire - Convertisseur UFC
// ==========================================
// Comptage brut de colonies + volume de prélèvement -> UFC/g, via la
// table de conversion de l'instantané
// Invoqué uniquement pour les levures/moisissures mesurées sur les
// prélèvements d'air ("Air Statique"), avant comparaison au seuil de zone
// ==========================================

use crate::domain::rule::RuleSnapshot;

// ==========================================
// ConversionOutcome - Résultat de conversion
// ==========================================
/// Résultat de conversion UFC
///
/// `degraded = true` signale un mode dégradé non bloquant: ligne ou
/// colonne de volume absente de la table, le comptage brut est renvoyé
/// inchangé et un avertissement est journalisé par l'appelant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionOutcome {
    pub ufc_per_g: f64,
    pub degraded: bool,
}

// ==========================================
// UfcConverter - Convertisseur UFC
// ==========================================
pub struct UfcConverter;

impl UfcConverter {
    /// Convertit un comptage brut en UFC/g pour un volume de référence
    ///
    /// # Règles
    /// 1. la ligne est cherchée sur le comptage brut EXACT (les comptages
    ///    de colonies sont entiers; une valeur fractionnaire n'a pas de ligne)
    /// 2. ligne trouvée: lecture de la colonne du volume demandé
    /// 3. ligne ou colonne absente: repli sur le comptage brut inchangé,
    ///    marqué dégradé (avertissement non fatal chez l'appelant)
    ///
    /// # Paramètres
    /// - snapshot: instantané portant la table de conversion
    /// - raw_count: comptage brut de colonies
    /// - volume_ml: volume de prélèvement nominal (100/250/500 mL)
    ///
    /// # Retour
    /// - ConversionOutcome: UFC/g + indicateur de dégradation
    pub fn convert(snapshot: &RuleSnapshot, raw_count: f64, volume_ml: i64) -> ConversionOutcome {
        let degraded = ConversionOutcome {
            ufc_per_g: raw_count,
            degraded: true,
        };

        // Les lignes sont indexées par comptage entier
        if raw_count.fract() != 0.0 || raw_count < 0.0 {
            return degraded;
        }

        let Some(row) = snapshot.ufc_row(raw_count as i64) else {
            return degraded;
        };

        match row.ufc_for_volume(volume_ml) {
            Some(ufc) => ConversionOutcome {
                ufc_per_g: ufc,
                degraded: false,
            },
            None => degraded,
        }
    }
}
