// ==========================================
// Système Qualité Laboratoire - Accès aux échantillons
// ==========================================
// Règle d'or: le repository ne porte aucune logique métier, toutes les
// requêtes sont paramétrées
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sample::Sample;
use crate::domain::types::{ShelfStage, Verdict};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SampleRepository - Accès aux échantillons
// ==========================================
/// Accès aux tables sample / sample_measurement
///
/// La pagination par (limit, offset) sert au recalcul en masse: la
/// boucle s'arrête à la première page courte
pub struct SampleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SampleRepository {
    /// Ouvre une connexion dédiée sur le fichier de base
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Réutilise une connexion partagée
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insère un échantillon et ses mesures (transaction)
    pub fn create(&self, sample: &Sample) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO sample (
                sample_id, sample_no, form_id, site,
                product_family, product_type, shelf_stage,
                ph_raw, acidity_raw, verdict, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                sample.sample_id,
                sample.sample_no,
                sample.form_id,
                sample.site,
                sample.product_family,
                sample.product_type,
                sample.shelf_stage.map(|s| s.as_str().to_string()),
                sample.ph_raw,
                sample.acidity_raw,
                sample.verdict.map(|v| v.as_str().to_string()),
                sample.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                sample.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        for (analyte, raw_value) in &sample.measurements {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO sample_measurement (sample_id, analyte, raw_value)
                VALUES (?1, ?2, ?3)
                "#,
                params![sample.sample_id, analyte, raw_value],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Enregistre ou remplace une mesure brute
    pub fn upsert_measurement(
        &self,
        sample_id: &str,
        analyte: &str,
        raw_value: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO sample_measurement (sample_id, analyte, raw_value)
            VALUES (?1, ?2, ?3)
            "#,
            params![sample_id, analyte, raw_value],
        )?;
        Ok(())
    }

    /// Cherche un échantillon par identifiant (mesures hydratées)
    pub fn find_by_id(&self, sample_id: &str) -> RepositoryResult<Option<Sample>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("{} WHERE sample_id = ?1", SELECT_SAMPLE),
            params![sample_id],
            map_sample_row,
        );

        match result {
            Ok(mut sample) => {
                sample.measurements = Self::load_measurements(&conn, &sample.sample_id)?;
                Ok(Some(sample))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Page d'échantillons ordonnée par identifiant (mesures hydratées)
    ///
    /// # Paramètres
    /// - limit: taille de page fixe
    /// - offset: décalage de la page
    ///
    /// # Retour
    /// - Ok(Vec<Sample>): une page courte (< limit) signale la fin
    pub fn find_page(&self, limit: usize, offset: usize) -> RepositoryResult<Vec<Sample>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY sample_id ASC LIMIT ?1 OFFSET ?2",
            SELECT_SAMPLE
        ))?;

        let mut samples = stmt
            .query_map(params![limit as i64, offset as i64], map_sample_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        drop(stmt);

        for sample in &mut samples {
            sample.measurements = Self::load_measurements(&conn, &sample.sample_id)?;
        }
        Ok(samples)
    }

    /// Met à jour le seul verdict d'un échantillon
    ///
    /// # Règles
    /// - seule la colonne verdict (et updated_at) est touchée
    /// - un identifiant inconnu est une erreur NotFound
    pub fn update_verdict(&self, sample_id: &str, verdict: Verdict) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            r#"
            UPDATE sample
            SET verdict = ?1, updated_at = datetime('now')
            WHERE sample_id = ?2
            "#,
            params![verdict.as_str(), sample_id],
        )?;

        if count == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Sample".to_string(),
                id: sample_id.to_string(),
            });
        }
        Ok(())
    }

    /// Nombre total d'échantillons
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sample", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_measurements(
        conn: &Connection,
        sample_id: &str,
    ) -> RepositoryResult<BTreeMap<String, String>> {
        let mut stmt = conn.prepare(
            "SELECT analyte, raw_value FROM sample_measurement WHERE sample_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![sample_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows.into_iter().collect())
    }
}

const SELECT_SAMPLE: &str = r#"
    SELECT
        sample_id, sample_no, form_id, site,
        product_family, product_type, shelf_stage,
        ph_raw, acidity_raw, verdict, created_at, updated_at
    FROM sample
"#;

fn map_sample_row(row: &Row<'_>) -> SqliteResult<Sample> {
    Ok(Sample {
        sample_id: row.get(0)?,
        sample_no: row.get(1)?,
        form_id: row.get(2)?,
        site: row.get(3)?,
        product_family: row.get(4)?,
        product_type: row.get(5)?,
        shelf_stage: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| ShelfStage::parse(&s)),
        ph_raw: row.get(7)?,
        acidity_raw: row.get(8)?,
        measurements: BTreeMap::new(),
        verdict: row
            .get::<_, Option<String>>(9)?
            .and_then(|v| Verdict::parse(&v)),
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

/// Lecture tolérante des horodatages historiques
fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| NaiveDateTime::default())
}
