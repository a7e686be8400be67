// ==========================================
// Système Qualité Laboratoire - Résolveur de règles
// ==========================================
// Pour un (site, famille, type, analyse, contexte) et un instantané de
// règles, renvoie la règle applicable ou "sans règle"
// Règle d'or: résolution totale et déterministe; ne lève jamais,
// ne laisse jamais la question ouverte
// ==========================================
// Ordre de résolution (priorité décroissante):
// 1. surcharge contextuelle AJ/DLC (fromage pasteurisé x levures/moisissures)
// 2. espace environnemental "Air Statique" (isolé, sans repli générique)
// 3. règles de seuil dynamiques actives (site exact avant joker)
// 4. table de repli embarquée
// 5. sans règle (état neutre, pas une erreur)
// ==========================================

use crate::domain::rule::{RuleSnapshot, ThresholdRule, ZoneRule};
use crate::domain::types::{RuleSource, ShelfStage};
use crate::engine::fallback::FallbackTable;
use crate::engine::normalizer::NameNormalizer;

/// Famille de produit des prélèvements d'air environnementaux
pub const AIR_STATIQUE_FAMILY: &str = "Air Statique";

/// Famille concernée par la surcharge AJ/DLC
pub const PASTEURIZED_CHEESE_FAMILY: &str = "Fromage Pasteurisé";

/// Borne forcée par la surcharge DLC (levures/moisissures, fromage pasteurisé)
pub const DLC_YEAST_MOLD_BOUND: f64 = 50001.0;

// ==========================================
// ResolvedRule - Règle résolue
// ==========================================
/// Règle effectivement applicable à une mesure, avec sa provenance
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    pub operator: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub source: RuleSource,
    /// Volume de prélèvement pour la conversion UFC (règles de zone)
    pub sample_volume_ml: Option<i64>,
    /// Libellé de zone (règles de zone)
    pub zone: Option<String>,
}

impl ResolvedRule {
    /// Règle à borne unique (zones et table de repli)
    ///
    /// La borne est rangée côté bas pour `>`/`>=`, côté haut sinon,
    /// en cohérence avec le comparateur
    fn from_single_bound(operator: &str, bound: f64, source: RuleSource) -> Self {
        let (lower, upper) = match operator {
            ">" | ">=" => (Some(bound), None),
            _ => (None, Some(bound)),
        };
        Self {
            operator: operator.to_string(),
            lower_bound: lower,
            upper_bound: upper,
            source,
            sample_volume_ml: None,
            zone: None,
        }
    }

    fn from_threshold_rule(rule: &ThresholdRule) -> Self {
        Self {
            operator: rule.operator.clone(),
            lower_bound: rule.lower_bound,
            upper_bound: rule.upper_bound,
            source: RuleSource::Dynamic,
            sample_volume_ml: None,
            zone: None,
        }
    }

    fn from_zone_rule(rule: &ZoneRule) -> Self {
        let mut resolved = Self::from_single_bound(&rule.operator, rule.bound, RuleSource::Zone);
        resolved.sample_volume_ml = Some(rule.sample_volume_ml);
        resolved.zone = Some(rule.zone.clone());
        resolved
    }
}

// ==========================================
// RuleResolver - Résolveur de règles
// ==========================================
pub struct RuleResolver;

impl RuleResolver {
    /// Résout la règle applicable à une analyse d'un échantillon
    ///
    /// # Paramètres
    /// - snapshot: instantané immuable des règles
    /// - site: site de l'échantillon
    /// - product_family: famille de produit (marque)
    /// - product_type: type de produit; nom d'emplacement pour "Air Statique"
    /// - analyte_label: libellé d'analyse saisi (passe par le normaliseur)
    /// - shelf_stage: marqueur AJ/DLC de l'échantillon
    ///
    /// # Retour
    /// - Some(ResolvedRule): règle applicable + provenance
    /// - None: sans règle (l'analyse n'est pas contrainte pour ce produit)
    pub fn resolve(
        snapshot: &RuleSnapshot,
        site: &str,
        product_family: &str,
        product_type: &str,
        analyte_label: &str,
        shelf_stage: Option<ShelfStage>,
    ) -> Option<ResolvedRule> {
        // Niveau 1: surcharge contextuelle AJ/DLC
        // Court-circuite toute règle dynamique ou de repli
        if NameNormalizer::matches(product_family, PASTEURIZED_CHEESE_FAMILY)
            && NameNormalizer::is_yeast_mold(analyte_label)
            && shelf_stage == Some(ShelfStage::Dlc)
        {
            return Some(ResolvedRule::from_single_bound(
                "<",
                DLC_YEAST_MOLD_BOUND,
                RuleSource::ContextOverride,
            ));
        }

        // Niveau 2: espace environnemental isolé
        // Un emplacement non répertorié reste SANS REGLE: on ne retombe
        // jamais sur l'espace de seuils générique
        if NameNormalizer::matches(product_family, AIR_STATIQUE_FAMILY) {
            return Self::find_zone_rule(snapshot, site, product_type)
                .map(ResolvedRule::from_zone_rule);
        }

        let candidate_keys = NameNormalizer::candidate_keys(analyte_label);

        // Niveau 3: règles dynamiques actives, premier match gagne
        if let Some(rule) = Self::find_threshold_rule(snapshot, site, product_family, &candidate_keys)
        {
            return Some(ResolvedRule::from_threshold_rule(rule));
        }

        // Niveau 4: table de repli embarquée
        for key in &candidate_keys {
            if let Some(bound) = FallbackTable::bound_for(product_family, key) {
                return Some(ResolvedRule::from_single_bound(
                    FallbackTable::operator_for_bound(bound),
                    bound,
                    RuleSource::Fallback,
                ));
            }
        }

        // Niveau 5: sans règle
        None
    }

    /// Cherche une règle dynamique pour les clés candidates, dans l'ordre
    ///
    /// # Règles
    /// - seules les règles actives de la famille exacte sont considérées
    /// - pour une même clé, une règle du site exact prime sur la règle joker
    fn find_threshold_rule<'a>(
        snapshot: &'a RuleSnapshot,
        site: &str,
        product_family: &'a str,
        candidate_keys: &[String],
    ) -> Option<&'a ThresholdRule> {
        for key in candidate_keys {
            let mut wildcard_match: Option<&ThresholdRule> = None;
            for rule in snapshot.threshold_rules_for_family(product_family) {
                if !NameNormalizer::matches(key, &rule.analyte) {
                    continue;
                }
                match &rule.site {
                    Some(rule_site) if NameNormalizer::matches(rule_site, site) => {
                        return Some(rule);
                    }
                    None if wildcard_match.is_none() => {
                        wildcard_match = Some(rule);
                    }
                    _ => {}
                }
            }
            if wildcard_match.is_some() {
                return wildcard_match;
            }
        }
        None
    }

    /// Cherche la règle de zone d'un emplacement (site exact avant joker)
    fn find_zone_rule<'a>(
        snapshot: &'a RuleSnapshot,
        site: &str,
        location_name: &str,
    ) -> Option<&'a ZoneRule> {
        let mut wildcard_match: Option<&ZoneRule> = None;
        for rule in snapshot.zone_rules() {
            if !NameNormalizer::matches(location_name, &rule.location_name) {
                continue;
            }
            match &rule.site {
                Some(rule_site) if NameNormalizer::matches(rule_site, site) => {
                    return Some(rule);
                }
                None if wildcard_match.is_none() => {
                    wildcard_match = Some(rule);
                }
                _ => {}
            }
        }
        wildcard_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{ThresholdRule, ZoneRule};
    use crate::domain::types::RuleSource;

    fn threshold_rule(
        id: &str,
        site: Option<&str>,
        family: &str,
        analyte: &str,
        operator: &str,
        upper: Option<f64>,
        active: bool,
    ) -> ThresholdRule {
        ThresholdRule {
            rule_id: id.to_string(),
            site: site.map(str::to_string),
            product_family: family.to_string(),
            analyte: analyte.to_string(),
            operator: operator.to_string(),
            lower_bound: None,
            upper_bound: upper,
            active,
        }
    }

    fn zone_rule(id: &str, site: Option<&str>, location: &str, bound: f64) -> ZoneRule {
        ZoneRule {
            rule_id: id.to_string(),
            site: site.map(str::to_string),
            location_name: location.to_string(),
            zone: format!("Zone {}", location),
            sample_volume_ml: 250,
            operator: "<".to_string(),
            bound,
            active: true,
        }
    }

    // ==========================================
    // Test 1: surcharge contextuelle DLC
    // ==========================================

    #[test]
    fn test_dlc_override_shortcircuits_dynamic_rule() {
        // Une règle dynamique contradictoire existe: la surcharge prime
        let snapshot = RuleSnapshot::new(
            vec![threshold_rule(
                "R1",
                None,
                PASTEURIZED_CHEESE_FAMILY,
                "Levures et Moisissures (5 jours)",
                "<",
                Some(10.0),
                true,
            )],
            vec![],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            PASTEURIZED_CHEESE_FAMILY,
            "Portion 200g",
            "Levures/Moisissures",
            Some(ShelfStage::Dlc),
        )
        .unwrap();

        assert_eq!(resolved.source, RuleSource::ContextOverride);
        assert_eq!(resolved.operator, "<");
        assert_eq!(resolved.upper_bound, Some(DLC_YEAST_MOLD_BOUND));
    }

    #[test]
    fn test_aj_stage_does_not_trigger_override() {
        let snapshot = RuleSnapshot::default();
        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            PASTEURIZED_CHEESE_FAMILY,
            "Portion 200g",
            "Levures/Moisissures",
            Some(ShelfStage::Aj),
        );
        // Sans règle dynamique ni entrée de repli sur cette variante datée,
        // la table de repli répond via la variante 5 jours
        let resolved = resolved.unwrap();
        assert_eq!(resolved.source, RuleSource::Fallback);
    }

    // ==========================================
    // Test 2: isolation de l'espace environnemental
    // ==========================================

    #[test]
    fn test_air_statique_unmapped_location_is_no_rule() {
        // Même avec une règle dynamique pour la famille "Air Statique",
        // l'espace environnemental reste isolé
        let snapshot = RuleSnapshot::new(
            vec![threshold_rule(
                "R1",
                None,
                AIR_STATIQUE_FAMILY,
                "Levures et Moisissures (3 jours)",
                "<",
                Some(5.0),
                true,
            )],
            vec![zone_rule("Z1", None, "Salle blanche", 10.0)],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            AIR_STATIQUE_FAMILY,
            "Quai d'expédition",
            "Levures/Moisissures",
            None,
        );
        assert!(resolved.is_none());
    }

    #[test]
    fn test_air_statique_mapped_location_uses_zone_rule() {
        let snapshot = RuleSnapshot::new(
            vec![],
            vec![zone_rule("Z1", None, "Salle blanche", 10.0)],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            AIR_STATIQUE_FAMILY,
            "Salle blanche",
            "Levures/Moisissures",
            None,
        )
        .unwrap();

        assert_eq!(resolved.source, RuleSource::Zone);
        assert_eq!(resolved.upper_bound, Some(10.0));
        assert_eq!(resolved.sample_volume_ml, Some(250));
        assert_eq!(resolved.zone.as_deref(), Some("Zone Salle blanche"));
    }

    #[test]
    fn test_zone_rule_site_precedence() {
        let snapshot = RuleSnapshot::new(
            vec![],
            vec![
                zone_rule("Z1", None, "Salle blanche", 20.0),
                zone_rule("Z2", Some("Laval"), "Salle blanche", 5.0),
            ],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            AIR_STATIQUE_FAMILY,
            "Salle blanche",
            "Levures/Moisissures",
            None,
        )
        .unwrap();
        assert_eq!(resolved.upper_bound, Some(5.0));
    }

    // ==========================================
    // Test 3: règles dynamiques
    // ==========================================

    #[test]
    fn test_dynamic_rule_exact_site_beats_wildcard() {
        let snapshot = RuleSnapshot::new(
            vec![
                threshold_rule("R1", None, "GYMA 0%", "Entérobactéries", "<", Some(100.0), true),
                threshold_rule(
                    "R2",
                    Some("Laval"),
                    "GYMA 0%",
                    "Entérobactéries",
                    "<",
                    Some(10.0),
                    true,
                ),
            ],
            vec![],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Entérobactéries",
            None,
        )
        .unwrap();
        assert_eq!(resolved.source, RuleSource::Dynamic);
        assert_eq!(resolved.upper_bound, Some(10.0));
    }

    #[test]
    fn test_inactive_dynamic_rule_falls_through_to_fallback() {
        let snapshot = RuleSnapshot::new(
            vec![threshold_rule(
                "R1",
                None,
                "GYMA 0%",
                "Entérobactéries",
                "<",
                Some(500.0),
                false,
            )],
            vec![],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Entérobactéries",
            None,
        )
        .unwrap();
        assert_eq!(resolved.source, RuleSource::Fallback);
        assert_eq!(resolved.upper_bound, Some(10.0));
    }

    #[test]
    fn test_candidate_key_order_first_match_wins() {
        // Règle sur la variante "et" seulement: atteinte via la 2e clé candidate
        let snapshot = RuleSnapshot::new(
            vec![threshold_rule(
                "R1",
                None,
                "GYMA 0%",
                "Levures et Moisissures (3 jours)",
                "<",
                Some(50.0),
                true,
            )],
            vec![],
            vec![],
        );

        let resolved = RuleResolver::resolve(
            &snapshot,
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Levures/Moisissures",
            None,
        )
        .unwrap();
        assert_eq!(resolved.source, RuleSource::Dynamic);
        assert_eq!(resolved.upper_bound, Some(50.0));
    }

    // ==========================================
    // Test 4: repli et sans-règle
    // ==========================================

    #[test]
    fn test_fallback_when_no_dynamic_rule() {
        let resolved = RuleResolver::resolve(
            &RuleSnapshot::default(),
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Entérobactéries",
            None,
        )
        .unwrap();
        assert_eq!(resolved.source, RuleSource::Fallback);
        assert_eq!(resolved.operator, "<");
        assert_eq!(resolved.upper_bound, Some(10.0));
    }

    #[test]
    fn test_unconstrained_analyte_is_no_rule() {
        let resolved = RuleResolver::resolve(
            &RuleSnapshot::default(),
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Listeria monocytogenes",
            None,
        );
        assert!(resolved.is_none());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let snapshot = RuleSnapshot::new(
            vec![threshold_rule(
                "R1",
                None,
                "GYMA 0%",
                "Entérobactéries",
                "<",
                Some(10.0),
                true,
            )],
            vec![],
            vec![],
        );
        let first = RuleResolver::resolve(
            &snapshot,
            "Laval",
            "GYMA 0%",
            "Pot 500g",
            "Entérobactéries",
            None,
        );
        for _ in 0..10 {
            let again = RuleResolver::resolve(
                &snapshot,
                "Laval",
                "GYMA 0%",
                "Pot 500g",
                "Entérobactéries",
                None,
            );
            assert_eq!(first, again);
        }
    }
}
