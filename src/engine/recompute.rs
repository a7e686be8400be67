// ==========================================
// Système Qualité Laboratoire - Moteur de recalcul
// ==========================================
// Recalcul en masse des verdicts de conformité contre un instantané
// de règles vivant
// Règle d'or: tolérance aux échecs partiels; un échec d'écriture est
// compté et n'interrompt jamais le traitement des lignes suivantes
// ==========================================
// Entrée: action administrative (après modification des règles)
// Sortie: {updated_count, error_count} + compteurs de suivi
// Lecture paginée (taille fixe, une page courte termine la boucle)
// pour borner la mémoire sur les grandes populations d'échantillons
// ==========================================

use crate::config::ConfigManager;
use crate::domain::alert::{NonConformityAlert, NonConformitySample};
use crate::domain::types::Verdict;
use crate::engine::conformity::ConformityEngine;
use crate::engine::notify::{AlertNotifier, OptionalAlertNotifier};
use crate::repository::{
    AnalyteAssignmentRepository, SampleRepository, SnapshotLoader,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// RecomputeReport - Rapport de recalcul
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeReport {
    /// Identifiant de la passe de recalcul
    pub run_id: String,
    /// Échantillons évalués
    pub evaluated_count: usize,
    /// Verdicts réécrits (seules les divergences sont écrites)
    pub updated_count: usize,
    /// Échecs d'écriture (ligne comptée, boucle poursuivie)
    pub error_count: usize,
    /// Bascules vers Non-conforme (déclencheurs d'alerte)
    pub flips_to_nonconforme: usize,
    /// Durée totale (millisecondes)
    pub elapsed_ms: i64,
}

// ==========================================
// RecomputeConfig - Configuration du recalcul
// ==========================================
#[derive(Debug, Clone)]
pub struct RecomputeConfig {
    /// Taille de page de lecture (écrasable par config recalcul/taille_page)
    pub default_page_size: usize,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            default_page_size: 200,
        }
    }
}

// ==========================================
// RecomputeEngine - Moteur de recalcul
// ==========================================
pub struct RecomputeEngine {
    // Dépendances de persistance
    sample_repo: Arc<SampleRepository>,
    assignment_repo: Arc<AnalyteAssignmentRepository>,
    snapshot_loader: Arc<SnapshotLoader>,

    // Notification (inversion de dépendance: le moteur définit le trait)
    notifier: OptionalAlertNotifier,

    // Configuration
    config: RecomputeConfig,
    config_manager: Arc<ConfigManager>,
}

impl RecomputeEngine {
    pub fn new(
        sample_repo: Arc<SampleRepository>,
        assignment_repo: Arc<AnalyteAssignmentRepository>,
        snapshot_loader: Arc<SnapshotLoader>,
        config: RecomputeConfig,
        config_manager: Arc<ConfigManager>,
        notifier: Option<Arc<dyn AlertNotifier>>,
    ) -> Self {
        let notifier = match notifier {
            Some(n) => OptionalAlertNotifier::with_notifier(n),
            None => OptionalAlertNotifier::none(),
        };
        Self {
            sample_repo,
            assignment_repo,
            snapshot_loader,
            notifier,
            config,
            config_manager,
        }
    }

    /// Constructeur avec configuration par défaut
    pub fn with_default_config(
        sample_repo: Arc<SampleRepository>,
        assignment_repo: Arc<AnalyteAssignmentRepository>,
        snapshot_loader: Arc<SnapshotLoader>,
        config_manager: Arc<ConfigManager>,
        notifier: Option<Arc<dyn AlertNotifier>>,
    ) -> Self {
        Self::new(
            sample_repo,
            assignment_repo,
            snapshot_loader,
            RecomputeConfig::default(),
            config_manager,
            notifier,
        )
    }

    // ==========================================
    // Méthode centrale
    // ==========================================

    /// Recalcule tous les verdicts et n'écrit que les divergences
    ///
    /// # Règles
    /// 1. un seul instantané de règles, chargé en début de passe,
    ///    immuable jusqu'à la fin
    /// 2. lecture paginée des échantillons (une page courte = fin)
    /// 3. écritures séquentielles, échantillon par échantillon; un échec
    ///    est compté dans error_count et la boucle continue
    /// 4. passe idempotente: relancée sans changement de données, elle
    ///    ne réécrit rien
    /// 5. les bascules vers Non-conforme déclenchent une alerte
    ///    "fire-and-forget" dont l'échec n'est jamais fatal
    ///
    /// # Paramètres
    /// - operator: opérateur ayant déclenché l'action administrative
    ///
    /// # Retour
    /// - Ok(RecomputeReport): compteurs de la passe
    /// - Err: échec du chargement initial (instantané ou affectations)
    #[instrument(skip(self), fields(operator = %operator))]
    pub fn recompute_all(&self, operator: &str) -> Result<RecomputeReport, Box<dyn Error>> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        // 1. Instantané cohérent: règles + zones + table de conversion
        let snapshot = self.snapshot_loader.load()?;
        tracing::info!(
            run_id = %run_id,
            regles = snapshot.threshold_rule_count(),
            zones = snapshot.zone_rule_count(),
            conversions = snapshot.ufc_row_count(),
            "Instantané de règles chargé"
        );

        // 2. Affectations d'analyses groupées par fiche
        let assignments_by_form = self.assignment_repo.find_all_grouped()?;

        let page_size = self.resolve_page_size();

        let mut evaluated_count = 0usize;
        let mut updated_count = 0usize;
        let mut error_count = 0usize;
        let mut flipped: Vec<NonConformitySample> = Vec::new();

        // 3. Boucle paginée sur la population d'échantillons
        let mut offset = 0usize;
        loop {
            let page = self.sample_repo.find_page(page_size, offset)?;
            let page_len = page.len();

            for sample in &page {
                let assignments = assignments_by_form
                    .get(&sample.form_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);

                let evaluation = ConformityEngine::evaluate(&snapshot, sample, assignments);
                evaluated_count += 1;

                // 4. Écriture des seules divergences
                if !evaluation.has_drift() {
                    continue;
                }

                match self
                    .sample_repo
                    .update_verdict(&sample.sample_id, evaluation.fresh_verdict)
                {
                    Ok(()) => {
                        updated_count += 1;
                        if evaluation.fresh_verdict == Verdict::NonConforme {
                            flipped.push(NonConformitySample {
                                sample_no: sample.sample_no.clone(),
                                product_family: sample.product_family.clone(),
                                product_type: sample.product_type.clone(),
                                reasons: evaluation.nonconformity_reasons(),
                            });
                        }
                    }
                    Err(e) => {
                        // Échec d'écriture: compté, la boucle continue
                        error_count += 1;
                        tracing::error!(
                            sample_no = %sample.sample_no,
                            erreur = %e,
                            "Échec d'écriture du verdict, ligne suivante"
                        );
                    }
                }
            }

            offset += page_len;
            // Une page courte signale la fin des données
            if page_len < page_size {
                break;
            }
        }

        // 5. Alerte sur les bascules (non bloquante)
        let flips_to_nonconforme = flipped.len();
        if !flipped.is_empty() {
            self.dispatch_alert(flipped);
        }

        let report = RecomputeReport {
            run_id,
            evaluated_count,
            updated_count,
            error_count,
            flips_to_nonconforme,
            elapsed_ms: started.elapsed().as_millis() as i64,
        };
        tracing::info!(
            evalues = report.evaluated_count,
            reecrits = report.updated_count,
            echecs = report.error_count,
            bascules = report.flips_to_nonconforme,
            duree_ms = report.elapsed_ms,
            "Recalcul terminé"
        );
        Ok(report)
    }

    // ==========================================
    // Méthodes auxiliaires
    // ==========================================

    /// Taille de page effective (config base > défaut code)
    fn resolve_page_size(&self) -> usize {
        match self.config_manager.recompute_page_size() {
            Ok(Some(size)) if size > 0 => size,
            Ok(_) => self.config.default_page_size,
            Err(e) => {
                tracing::warn!(
                    erreur = %e,
                    "Lecture de la taille de page impossible, défaut appliqué"
                );
                self.config.default_page_size
            }
        }
    }

    /// Remet l'alerte de non-conformité sans bloquer le recalcul
    ///
    /// Le notificateur est asynchrone; le moteur, synchrone, s'adosse au
    /// runtime courant s'il existe, sinon en crée un éphémère
    fn dispatch_alert(&self, samples: Vec<NonConformitySample>) {
        if !self.notifier.is_configured() {
            return;
        }
        if !self.config_manager.alerts_enabled().unwrap_or(true) {
            tracing::info!("Alertes désactivées par configuration, envoi ignoré");
            return;
        }

        let recipient = match self.config_manager.alert_recipient() {
            Ok(Some(r)) => r,
            Ok(None) => {
                tracing::warn!("Aucun destinataire d'alerte configuré, envoi ignoré");
                return;
            }
            Err(e) => {
                tracing::warn!(erreur = %e, "Lecture du destinataire impossible, envoi ignoré");
                return;
            }
        };

        let alert = NonConformityAlert::for_recompute(recipient, samples);
        let sent = if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.notifier.notify(alert)))
        } else {
            match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(self.notifier.notify(alert)),
                Err(e) => Err(Box::new(e) as Box<dyn Error + Send + Sync>),
            }
        };

        match sent {
            Ok(delivery_id) => {
                if !delivery_id.is_empty() {
                    tracing::info!(remise = %delivery_id, "Alerte de non-conformité envoyée");
                }
            }
            Err(e) => {
                // Échec de remise: avertissement, jamais fatal
                tracing::warn!(erreur = %e, "Échec d'envoi de l'alerte, recalcul non affecté");
            }
        }
    }
}
