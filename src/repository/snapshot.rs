// ==========================================
// Système Qualité Laboratoire - Chargeur d'instantané
// ==========================================
// Assemble en un appel l'instantané immuable de règles passé au
// résolveur et à l'agrégateur: règles de seuil actives, règles de
// zone actives, table de conversion UFC
// ==========================================
// Remplace les caches mutables historiquement rechargés au fil de
// l'eau par les écrans: une passe = un instantané
// ==========================================

use crate::domain::rule::RuleSnapshot;
use crate::repository::error::RepositoryResult;
use crate::repository::rule_repo::{
    ThresholdRuleRepository, UfcConversionRepository, ZoneRuleRepository,
};
use std::sync::Arc;

// ==========================================
// SnapshotLoader - Chargeur d'instantané
// ==========================================
pub struct SnapshotLoader {
    threshold_repo: Arc<ThresholdRuleRepository>,
    zone_repo: Arc<ZoneRuleRepository>,
    ufc_repo: Arc<UfcConversionRepository>,
}

impl SnapshotLoader {
    pub fn new(
        threshold_repo: Arc<ThresholdRuleRepository>,
        zone_repo: Arc<ZoneRuleRepository>,
        ufc_repo: Arc<UfcConversionRepository>,
    ) -> Self {
        Self {
            threshold_repo,
            zone_repo,
            ufc_repo,
        }
    }

    /// Charge un instantané cohérent des trois collections
    ///
    /// # Retour
    /// - Ok(RuleSnapshot): instantané immuable pour une passe complète
    /// - Err: échec de lecture (fatal pour la passe, avant tout calcul)
    pub fn load(&self) -> RepositoryResult<RuleSnapshot> {
        let threshold_rules = self.threshold_repo.find_active()?;
        let zone_rules = self.zone_repo.find_active()?;
        let ufc_rows = self.ufc_repo.find_all()?;
        Ok(RuleSnapshot::new(threshold_rules, zone_rules, ufc_rows))
    }
}
