// ==========================================
// Système Qualité Laboratoire - Initialisation SQLite
// ==========================================
// Objectifs:
// - unifier les PRAGMA de toutes les ouvertures de connexion (clés
//   étrangères activées partout, pas "selon le module")
// - unifier busy_timeout pour limiter les erreurs busy en écriture
// - porter le schéma de référence (création idempotente)
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// busy_timeout par défaut (millisecondes)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Version de schéma attendue par le code
///
/// Sert d'avertissement (pas de migration automatique): on évite de
/// tourner silencieusement sur une base obsolète
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Applique les PRAGMA unifiés à une connexion
///
/// foreign_keys et busy_timeout se configurent par connexion
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Ouvre une connexion SQLite avec la configuration unifiée
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Lit la version de schéma (None si la table n'existe pas)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Crée le schéma de référence (idempotent)
///
/// Utilisé au premier lancement et par les bases temporaires de test
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS sample (
            sample_id TEXT PRIMARY KEY,
            sample_no TEXT NOT NULL,
            form_id TEXT NOT NULL,
            site TEXT NOT NULL,
            product_family TEXT NOT NULL,
            product_type TEXT NOT NULL,
            shelf_stage TEXT,
            ph_raw TEXT,
            acidity_raw TEXT,
            verdict TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sample_form ON sample(form_id);

        CREATE TABLE IF NOT EXISTS sample_measurement (
            sample_id TEXT NOT NULL REFERENCES sample(sample_id) ON DELETE CASCADE,
            analyte TEXT NOT NULL,
            raw_value TEXT NOT NULL,
            PRIMARY KEY (sample_id, analyte)
        );

        CREATE TABLE IF NOT EXISTS threshold_rule (
            rule_id TEXT PRIMARY KEY,
            site TEXT,
            product_family TEXT NOT NULL,
            analyte TEXT NOT NULL,
            operator TEXT NOT NULL,
            lower_bound REAL,
            upper_bound REAL,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_threshold_rule_family
            ON threshold_rule(product_family, analyte);

        CREATE TABLE IF NOT EXISTS zone_rule (
            rule_id TEXT PRIMARY KEY,
            site TEXT,
            location_name TEXT NOT NULL,
            zone TEXT NOT NULL,
            sample_volume_ml INTEGER NOT NULL,
            operator TEXT NOT NULL,
            bound REAL NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS ufc_conversion (
            raw_count INTEGER PRIMARY KEY,
            ufc_100ml REAL NOT NULL,
            ufc_250ml REAL NOT NULL,
            ufc_500ml REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS analyte_assignment (
            form_id TEXT NOT NULL,
            analyte TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            PRIMARY KEY (form_id, analyte)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )
}
