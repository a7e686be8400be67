// ==========================================
// Système Qualité Laboratoire - Table de repli
// ==========================================
// Règles d'acceptation de dernier recours, embarquées dans le code,
// consultées uniquement quand aucune règle dynamique ne correspond
// ==========================================
// Convention: opérateur implicite "<"; une borne de 0 signifie
// "absence totale exigée" (valeur == 0), pas "toujours invalide"
// ==========================================

use crate::engine::normalizer::NameNormalizer;

/// Borne de repli par (famille de produit, clé d'analyse)
///
/// Carte imbriquée famille -> analyse -> borne, figée à la compilation.
/// Les entrées reprennent les seuils internes historiques du laboratoire
type FamilyEntry = (&'static str, &'static [(&'static str, f64)]);

const FALLBACK_TABLE: &[FamilyEntry] = &[
    (
        "GYMA 0%",
        &[
            ("Entérobactéries", 10.0),
            ("Coliformes totaux", 10.0),
            ("Escherichia coli", 0.0),
            ("Staphylocoques à coagulase positive", 0.0),
            ("Levures et Moisissures (3 jours)", 100.0),
        ],
    ),
    (
        "GYMA 40%",
        &[
            ("Entérobactéries", 10.0),
            ("Coliformes totaux", 10.0),
            ("Escherichia coli", 0.0),
            ("Levures et Moisissures (3 jours)", 100.0),
        ],
    ),
    (
        "Fromage Pasteurisé",
        &[
            ("Entérobactéries", 10.0),
            ("Escherichia coli", 0.0),
            ("Listeria monocytogenes", 0.0),
            ("Salmonella", 0.0),
            ("Levures et Moisissures (5 jours)", 1000.0),
        ],
    ),
    (
        "Crème Dessert",
        &[
            ("Flore totale 30°C", 100000.0),
            ("Entérobactéries", 10.0),
            ("Levures et Moisissures (5 jours)", 100.0),
        ],
    ),
    (
        "Beurre",
        &[
            ("Entérobactéries", 10.0),
            ("Coliformes totaux", 10.0),
            ("Levures et Moisissures (5 jours)", 100.0),
        ],
    ),
];

// ==========================================
// FallbackTable - Accès à la table de repli
// ==========================================
pub struct FallbackTable;

impl FallbackTable {
    /// Borne de repli pour un couple (famille, clé d'analyse)
    ///
    /// La comparaison des clés passe par la forme pliée du normaliseur
    /// (les écarts d'espaces et de casse ne font pas rater une entrée)
    ///
    /// # Retour
    /// - Some(borne): entrée trouvée, à appliquer avec l'opérateur "<"
    ///   (ou la convention d'absence si borne == 0)
    /// - None: pas d'entrée
    pub fn bound_for(product_family: &str, analyte_key: &str) -> Option<f64> {
        let family_entry = FALLBACK_TABLE
            .iter()
            .find(|(family, _)| NameNormalizer::matches(product_family, family))?;

        family_entry
            .1
            .iter()
            .find(|(key, _)| NameNormalizer::matches(analyte_key, key))
            .map(|(_, bound)| *bound)
    }

    /// Opérateur appliqué aux entrées de repli
    ///
    /// Borne 0 => exigence d'absence (`=`), sinon `<`
    pub fn operator_for_bound(bound: f64) -> &'static str {
        if bound == 0.0 {
            "="
        } else {
            "<"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gyma_enterobacteries_entry() {
        assert_eq!(FallbackTable::bound_for("GYMA 0%", "Entérobactéries"), Some(10.0));
    }

    #[test]
    fn test_absence_entry_has_eq_operator() {
        let bound = FallbackTable::bound_for("Fromage Pasteurisé", "Salmonella").unwrap();
        assert_eq!(bound, 0.0);
        assert_eq!(FallbackTable::operator_for_bound(bound), "=");
        assert_eq!(FallbackTable::operator_for_bound(10.0), "<");
    }

    #[test]
    fn test_lookup_is_fold_insensitive() {
        assert_eq!(
            FallbackTable::bound_for("gyma 0%", "entérobactéries"),
            Some(10.0)
        );
    }

    #[test]
    fn test_unknown_family_or_analyte() {
        assert_eq!(FallbackTable::bound_for("Yaourt Grec", "Entérobactéries"), None);
        assert_eq!(FallbackTable::bound_for("GYMA 0%", "Listeria monocytogenes"), None);
    }
}
