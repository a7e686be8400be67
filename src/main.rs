// ==========================================
// Système Qualité Laboratoire - Recalcul administratif
// ==========================================
// Point d'entrée de l'action administrative: recalcul en masse des
// verdicts de conformité contre les règles courantes
// Contrat de sortie: {updated_count, error_count}; aucune autre
// surface de ligne de commande
// ==========================================

use labo_qc::config::ConfigManager;
use labo_qc::repository::{
    AnalyteAssignmentRepository, SampleRepository, SnapshotLoader, ThresholdRuleRepository,
    UfcConversionRepository, ZoneRuleRepository,
};
use labo_qc::QualityApi;
use rusqlite::Connection;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

fn main() -> ExitCode {
    labo_qc::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - recalcul de conformité", labo_qc::APP_NAME);
    tracing::info!("Version: {}", labo_qc::VERSION);
    tracing::info!("==================================================");

    let db_path = default_db_path();
    tracing::info!("Base de données: {}", db_path);

    let conn = match open_database(&db_path) {
        Ok(conn) => Arc::new(Mutex::new(conn)),
        Err(e) => {
            tracing::error!("Ouverture de la base impossible: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sample_repo = Arc::new(SampleRepository::from_connection(conn.clone()));
    let assignment_repo = Arc::new(AnalyteAssignmentRepository::from_connection(conn.clone()));
    let threshold_repo = Arc::new(ThresholdRuleRepository::from_connection(conn.clone()));
    let zone_repo = Arc::new(ZoneRuleRepository::from_connection(conn.clone()));
    let ufc_repo = Arc::new(UfcConversionRepository::from_connection(conn.clone()));
    let snapshot_loader = Arc::new(SnapshotLoader::new(threshold_repo, zone_repo, ufc_repo));
    let config_manager = match ConfigManager::from_connection(conn) {
        Ok(cm) => Arc::new(cm),
        Err(e) => {
            tracing::error!("Initialisation de la configuration impossible: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let api = QualityApi::new(
        sample_repo,
        assignment_repo,
        snapshot_loader,
        config_manager,
        None,
    );

    match api.recompute_all("admin") {
        Ok(report) => {
            tracing::info!(
                "Recalcul terminé: {} verdict(s) réécrit(s), {} échec(s)",
                report.updated_count,
                report.error_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Recalcul échoué: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Chemin par défaut de la base applicative
fn default_db_path() -> String {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("labo-qc");
    dir.join("labo_qc.sqlite").to_string_lossy().to_string()
}

/// Ouvre la base et garantit le schéma (premier lancement compris)
fn open_database(db_path: &str) -> Result<Connection, Box<dyn std::error::Error>> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = labo_qc::db::open_sqlite_connection(db_path)?;
    labo_qc::db::init_schema(&conn)?;

    match labo_qc::db::read_schema_version(&conn)? {
        Some(version) if version != labo_qc::db::CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "Version de schéma {} différente de la version attendue {}",
                version,
                labo_qc::db::CURRENT_SCHEMA_VERSION
            );
        }
        _ => {}
    }
    Ok(conn)
}
