// ==========================================
// Système Qualité Laboratoire - Accès aux règles
// ==========================================
// Trois espaces de données: règles de seuil dynamiques, règles de zone
// environnementale, table de conversion UFC
// Règle d'or: le repository ne porte aucune logique métier
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::rule::{ThresholdRule, UfcConversionRow, ZoneRule};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// Lignes de conversion par défaut (table NPP interne du laboratoire)
// (comptage brut, UFC/g à 100 mL, 250 mL, 500 mL)
const DEFAULT_UFC_ROWS: [(i64, f64, f64, f64); 11] = [
    (0, 0.0, 0.0, 0.0),
    (1, 11.0, 4.0, 2.0),
    (2, 22.0, 9.0, 4.0),
    (3, 36.0, 14.0, 7.0),
    (4, 48.0, 19.0, 9.0),
    (5, 61.0, 23.0, 11.0),
    (6, 75.0, 28.0, 14.0),
    (7, 90.0, 33.0, 16.0),
    (8, 106.0, 38.0, 19.0),
    (9, 123.0, 44.0, 21.0),
    (10, 141.0, 50.0, 24.0),
];

// ==========================================
// ThresholdRuleRepository - Règles de seuil
// ==========================================
pub struct ThresholdRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ThresholdRuleRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insère ou remplace une règle de seuil
    pub fn upsert(&self, rule: &ThresholdRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO threshold_rule (
                rule_id, site, product_family, analyte,
                operator, lower_bound, upper_bound, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                rule.rule_id,
                rule.site,
                rule.product_family,
                rule.analyte,
                rule.operator,
                rule.lower_bound,
                rule.upper_bound,
                rule.active,
            ],
        )?;
        Ok(())
    }

    /// Règles actives (alimentation de l'instantané)
    pub fn find_active(&self) -> RepositoryResult<Vec<ThresholdRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE active = 1 ORDER BY product_family, analyte, rule_id",
            SELECT_THRESHOLD_RULE
        ))?;
        let rules = stmt
            .query_map([], map_threshold_rule_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }

    /// Active ou désactive une règle
    pub fn set_active(&self, rule_id: &str, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "UPDATE threshold_rule SET active = ?1 WHERE rule_id = ?2",
            params![active, rule_id],
        )?;
        if count == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ThresholdRule".to_string(),
                id: rule_id.to_string(),
            });
        }
        Ok(())
    }
}

const SELECT_THRESHOLD_RULE: &str = r#"
    SELECT rule_id, site, product_family, analyte,
           operator, lower_bound, upper_bound, active
    FROM threshold_rule
"#;

fn map_threshold_rule_row(row: &Row<'_>) -> SqliteResult<ThresholdRule> {
    Ok(ThresholdRule {
        rule_id: row.get(0)?,
        site: row.get(1)?,
        product_family: row.get(2)?,
        analyte: row.get(3)?,
        operator: row.get(4)?,
        lower_bound: row.get(5)?,
        upper_bound: row.get(6)?,
        active: row.get(7)?,
    })
}

// ==========================================
// ZoneRuleRepository - Règles de zone
// ==========================================
pub struct ZoneRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ZoneRuleRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insère ou remplace une règle de zone
    pub fn upsert(&self, rule: &ZoneRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO zone_rule (
                rule_id, site, location_name, zone,
                sample_volume_ml, operator, bound, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                rule.rule_id,
                rule.site,
                rule.location_name,
                rule.zone,
                rule.sample_volume_ml,
                rule.operator,
                rule.bound,
                rule.active,
            ],
        )?;
        Ok(())
    }

    /// Règles de zone actives (alimentation de l'instantané)
    pub fn find_active(&self) -> RepositoryResult<Vec<ZoneRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT rule_id, site, location_name, zone,
                   sample_volume_ml, operator, bound, active
            FROM zone_rule
            WHERE active = 1
            ORDER BY location_name, rule_id
            "#,
        )?;
        let rules = stmt
            .query_map([], |row| {
                Ok(ZoneRule {
                    rule_id: row.get(0)?,
                    site: row.get(1)?,
                    location_name: row.get(2)?,
                    zone: row.get(3)?,
                    sample_volume_ml: row.get(4)?,
                    operator: row.get(5)?,
                    bound: row.get(6)?,
                    active: row.get(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }
}

// ==========================================
// UfcConversionRepository - Table de conversion UFC
// ==========================================
pub struct UfcConversionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UfcConversionRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insère ou remplace une ligne de conversion
    pub fn upsert(&self, row: &UfcConversionRow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO ufc_conversion (raw_count, ufc_100ml, ufc_250ml, ufc_500ml)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![row.raw_count, row.ufc_100ml, row.ufc_250ml, row.ufc_500ml],
        )?;
        Ok(())
    }

    /// Toute la table de conversion (alimentation de l'instantané)
    pub fn find_all(&self) -> RepositoryResult<Vec<UfcConversionRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT raw_count, ufc_100ml, ufc_250ml, ufc_500ml FROM ufc_conversion ORDER BY raw_count",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UfcConversionRow {
                    raw_count: row.get(0)?,
                    ufc_100ml: row.get(1)?,
                    ufc_250ml: row.get(2)?,
                    ufc_500ml: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Insère les lignes par défaut sans écraser l'existant
    ///
    /// # Retour
    /// - Ok(usize): nombre de lignes effectivement insérées
    pub fn seed_defaults(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut inserted = 0;
        for (raw_count, ufc_100, ufc_250, ufc_500) in DEFAULT_UFC_ROWS {
            inserted += tx.execute(
                r#"
                INSERT OR IGNORE INTO ufc_conversion (raw_count, ufc_100ml, ufc_250ml, ufc_500ml)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![raw_count, ufc_100, ufc_250, ufc_500],
            )?;
        }

        tx.commit()?;
        Ok(inserted)
    }
}
