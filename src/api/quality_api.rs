// ==========================================
// Système Qualité Laboratoire - API de conformité
// ==========================================
// Interface appelée par les écrans: évaluation à la demande d'un
// échantillon (coloration des cellules) et recalcul en masse
// (action administrative)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::engine::conformity::{ConformityEngine, SampleEvaluation};
use crate::engine::notify::AlertNotifier;
use crate::engine::recompute::{RecomputeConfig, RecomputeEngine, RecomputeReport};
use crate::repository::{
    AnalyteAssignmentRepository, SampleRepository, SnapshotLoader,
};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// QualityApi - API de conformité
// ==========================================
/// API de conformité
///
/// 1. évaluation à la demande d'un échantillon (statuts par analyse,
///    calculés à la volée, jamais persistés par cette voie)
/// 2. déclenchement du recalcul en masse et restitution du rapport
pub struct QualityApi {
    sample_repo: Arc<SampleRepository>,
    assignment_repo: Arc<AnalyteAssignmentRepository>,
    snapshot_loader: Arc<SnapshotLoader>,
    recompute_engine: RecomputeEngine,
}

impl QualityApi {
    pub fn new(
        sample_repo: Arc<SampleRepository>,
        assignment_repo: Arc<AnalyteAssignmentRepository>,
        snapshot_loader: Arc<SnapshotLoader>,
        config_manager: Arc<ConfigManager>,
        notifier: Option<Arc<dyn AlertNotifier>>,
    ) -> Self {
        let recompute_engine = RecomputeEngine::new(
            sample_repo.clone(),
            assignment_repo.clone(),
            snapshot_loader.clone(),
            RecomputeConfig::default(),
            config_manager,
            notifier,
        );
        Self {
            sample_repo,
            assignment_repo,
            snapshot_loader,
            recompute_engine,
        }
    }

    // ==========================================
    // Évaluation à la demande
    // ==========================================

    /// Évalue un échantillon contre les règles courantes
    ///
    /// Calcule les statuts par analyse pour la coloration des cellules
    /// et expose le verdict recalculé à côté du verdict persisté
    /// (détection de dérive après modification des règles); rien n'est
    /// écrit en base par cette voie
    ///
    /// # Paramètres
    /// - sample_id: identifiant de l'échantillon
    ///
    /// # Retour
    /// - Ok(SampleEvaluation): verdict recalculé + détail par analyse
    /// - Err(ApiError::NotFound): échantillon inconnu
    pub fn evaluate_sample(&self, sample_id: &str) -> ApiResult<SampleEvaluation> {
        let sample = self
            .sample_repo
            .find_by_id(sample_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Échantillon {} introuvable", sample_id)))?;

        let assignments = self.assignment_repo.find_by_form(&sample.form_id)?;
        let snapshot = self.snapshot_loader.load()?;

        let evaluation = ConformityEngine::evaluate(&snapshot, &sample, &assignments);
        debug!(
            sample_no = %evaluation.sample_no,
            verdict = %evaluation.fresh_verdict,
            analyses = evaluation.analytes.len(),
            "Échantillon évalué à la demande"
        );
        Ok(evaluation)
    }

    // ==========================================
    // Recalcul en masse
    // ==========================================

    /// Recalcule tous les verdicts (action administrative)
    ///
    /// Contrat: seuls updated_count et error_count engagent l'appelant;
    /// les autres compteurs sont du suivi
    ///
    /// # Paramètres
    /// - operator: opérateur ayant déclenché l'action
    pub fn recompute_all(&self, operator: &str) -> ApiResult<RecomputeReport> {
        self.recompute_engine
            .recompute_all(operator)
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }
}
