// ==========================================
// Tests d'intégration de la couche persistance
// ==========================================
// Périmètre:
// 1. CRUD échantillons + hydratation des mesures
// 2. Pagination (page courte = fin de données)
// 3. Mise à jour isolée du verdict
// 4. Affectations groupées par fiche
// 5. Règles, table de conversion, configuration
// ==========================================


use labo_qc::config::ConfigManager;
use labo_qc::domain::rule::{ThresholdRule, ZoneRule};
use labo_qc::domain::sample::AnalyteAssignment;
use labo_qc::domain::types::{AssignmentStatus, Verdict};
use labo_qc::repository::{
    AnalyteAssignmentRepository, RepositoryError, SampleRepository, SnapshotLoader,
    ThresholdRuleRepository, UfcConversionRepository, ZoneRuleRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// Fonctions auxiliaires
// ==========================================

fn setup_test_db() -> (tempfile::NamedTempFile, Arc<Mutex<Connection>>) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("création de la base de test");
    let conn = test_helpers::open_test_connection(&db_path).expect("ouverture de la base");
    test_helpers::insert_test_config(&conn).expect("insertion de la configuration");
    (temp_file, Arc::new(Mutex::new(conn)))
}

// ==========================================
// Tests échantillons
// ==========================================

#[test]
fn test_sample_create_and_find_hydrates_measurements() {
    let (_temp_file, conn) = setup_test_db();
    let repo = SampleRepository::from_connection(conn);

    let sample = test_helpers::make_sample(
        "S001",
        "F001",
        "GYMA 0%",
        "Pot 500g",
        &[("Entérobactéries", "12"), ("Coliformes totaux", "3")],
        None,
    );
    repo.create(&sample).expect("création de l'échantillon");

    let found = repo.find_by_id("S001").expect("lecture").expect("présent");
    assert_eq!(found.sample_no, "2026-08-S001");
    assert_eq!(found.measurement("Entérobactéries"), Some("12"));
    assert_eq!(found.measurement("Coliformes totaux"), Some("3"));
    assert_eq!(found.verdict, None);

    assert!(repo.find_by_id("S999").expect("lecture").is_none());

    // Correction d'une saisie: la mesure est remplacée
    repo.upsert_measurement("S001", "Entérobactéries", "30")
        .expect("remplacement de la mesure");
    let found = repo.find_by_id("S001").expect("relecture").expect("présent");
    assert_eq!(found.measurement("Entérobactéries"), Some("30"));
}

#[test]
fn test_sample_pagination_short_page_signals_end() {
    let (_temp_file, conn) = setup_test_db();
    let repo = SampleRepository::from_connection(conn);

    for i in 1..=5 {
        let sample = test_helpers::make_sample(
            &format!("S{:03}", i),
            "F001",
            "GYMA 0%",
            "Pot 500g",
            &[("Entérobactéries", "2")],
            None,
        );
        repo.create(&sample).expect("création");
    }

    let page1 = repo.find_page(2, 0).expect("page 1");
    let page2 = repo.find_page(2, 2).expect("page 2");
    let page3 = repo.find_page(2, 4).expect("page 3");
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    assert_eq!(page3.len(), 1); // page courte: fin des données

    // Ordre stable par identifiant
    assert_eq!(page1[0].sample_id, "S001");
    assert_eq!(page3[0].sample_id, "S005");

    // Les mesures sont hydratées sur chaque page
    assert_eq!(page2[0].measurement("Entérobactéries"), Some("2"));
}

#[test]
fn test_update_verdict_touches_only_verdict() {
    let (_temp_file, conn) = setup_test_db();
    let repo = SampleRepository::from_connection(conn);

    let sample = test_helpers::make_sample(
        "S001",
        "F001",
        "GYMA 0%",
        "Pot 500g",
        &[("Entérobactéries", "25")],
        None,
    );
    repo.create(&sample).expect("création");

    repo.update_verdict("S001", Verdict::NonConforme)
        .expect("mise à jour du verdict");

    let found = repo.find_by_id("S001").expect("lecture").expect("présent");
    assert_eq!(found.verdict, Some(Verdict::NonConforme));
    // Les mesures ne sont pas affectées
    assert_eq!(found.measurement("Entérobactéries"), Some("25"));
}

#[test]
fn test_update_verdict_unknown_sample_is_not_found() {
    let (_temp_file, conn) = setup_test_db();
    let repo = SampleRepository::from_connection(conn);

    let result = repo.update_verdict("S404", Verdict::Conforme);
    match result {
        Err(RepositoryError::NotFound { entity, id }) => {
            assert_eq!(entity, "Sample");
            assert_eq!(id, "S404");
        }
        _ => panic!("NotFound attendu"),
    }
}

// ==========================================
// Tests affectations
// ==========================================

#[test]
fn test_assignments_grouped_by_form() {
    let (_temp_file, conn) = setup_test_db();
    let repo = AnalyteAssignmentRepository::from_connection(conn);

    for (form, analyte) in [
        ("F001", "Entérobactéries"),
        ("F001", "Levures/Moisissures"),
        ("F002", "Salmonella"),
    ] {
        repo.upsert(&AnalyteAssignment {
            form_id: form.to_string(),
            analyte: analyte.to_string(),
            status: AssignmentStatus::Pending,
        })
        .expect("insertion");
    }

    let grouped = repo.find_all_grouped().expect("groupement");
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped.get("F001").unwrap().len(), 2);
    assert_eq!(grouped.get("F002").unwrap().len(), 1);

    let f001 = repo.find_by_form("F001").expect("lecture par fiche");
    assert_eq!(f001.len(), 2);

    repo.set_status("F001", "Entérobactéries", AssignmentStatus::Completed)
        .expect("mise à jour du statut");
    let f001 = repo.find_by_form("F001").expect("relecture");
    let entero = f001
        .iter()
        .find(|a| a.analyte == "Entérobactéries")
        .unwrap();
    assert_eq!(entero.status, AssignmentStatus::Completed);
}

// ==========================================
// Tests règles et instantané
// ==========================================

#[test]
fn test_snapshot_loader_collects_active_rules_only() {
    let (_temp_file, conn) = setup_test_db();
    let threshold_repo = Arc::new(ThresholdRuleRepository::from_connection(conn.clone()));
    let zone_repo = Arc::new(ZoneRuleRepository::from_connection(conn.clone()));
    let ufc_repo = Arc::new(UfcConversionRepository::from_connection(conn));

    threshold_repo
        .upsert(&ThresholdRule {
            rule_id: "R1".to_string(),
            site: None,
            product_family: "GYMA 0%".to_string(),
            analyte: "Entérobactéries".to_string(),
            operator: "<".to_string(),
            lower_bound: None,
            upper_bound: Some(10.0),
            active: true,
        })
        .expect("insertion R1");
    threshold_repo
        .upsert(&ThresholdRule {
            rule_id: "R2".to_string(),
            site: None,
            product_family: "GYMA 0%".to_string(),
            analyte: "Coliformes totaux".to_string(),
            operator: "<".to_string(),
            lower_bound: None,
            upper_bound: Some(10.0),
            active: false,
        })
        .expect("insertion R2");
    zone_repo
        .upsert(&ZoneRule {
            rule_id: "Z1".to_string(),
            site: None,
            location_name: "Salle blanche".to_string(),
            zone: "Zone A".to_string(),
            sample_volume_ml: 250,
            operator: "<".to_string(),
            bound: 10.0,
            active: true,
        })
        .expect("insertion Z1");
    ufc_repo.seed_defaults().expect("amorçage UFC");

    let loader = SnapshotLoader::new(threshold_repo.clone(), zone_repo, ufc_repo);
    let snapshot = loader.load().expect("chargement de l'instantané");

    assert_eq!(snapshot.threshold_rule_count(), 1); // R2 inactive exclue
    assert_eq!(snapshot.zone_rule_count(), 1);
    assert_eq!(snapshot.ufc_row_count(), 11);

    // Désactivation puis rechargement: l'instantané suit la base
    threshold_repo.set_active("R1", false).expect("désactivation");
    let snapshot = loader.load().expect("rechargement");
    assert_eq!(snapshot.threshold_rule_count(), 0);
}

#[test]
fn test_ufc_seed_defaults_is_idempotent() {
    let (_temp_file, conn) = setup_test_db();
    let ufc_repo = UfcConversionRepository::from_connection(conn);

    let first = ufc_repo.seed_defaults().expect("premier amorçage");
    assert_eq!(first, 11);
    let second = ufc_repo.seed_defaults().expect("second amorçage");
    assert_eq!(second, 0); // rien à réinsérer

    let rows = ufc_repo.find_all().expect("lecture");
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0].raw_count, 0);
    assert_eq!(rows[0].ufc_100ml, 0.0);
}

// ==========================================
// Tests configuration
// ==========================================

#[test]
fn test_config_manager_typed_reads() {
    let (_temp_file, conn) = setup_test_db();
    let config = ConfigManager::from_connection(conn).expect("gestionnaire de configuration");

    // Clés absentes: défauts côté appelant
    assert_eq!(config.recompute_page_size().expect("lecture"), None);
    assert!(config.alerts_enabled().expect("lecture"));
    assert_eq!(
        config.alert_recipient().expect("lecture"),
        Some("qualite@exemple.fr".to_string())
    );

    config
        .set_config_value("recalcul/taille_page", "50")
        .expect("écriture");
    assert_eq!(config.recompute_page_size().expect("lecture"), Some(50));

    config
        .set_config_value("alertes/actives", "false")
        .expect("écriture");
    assert!(!config.alerts_enabled().expect("lecture"));

    // Valeur illisible: défaut appliqué
    config
        .set_config_value("recalcul/taille_page", "beaucoup")
        .expect("écriture");
    assert_eq!(config.recompute_page_size().expect("lecture"), None);
}
