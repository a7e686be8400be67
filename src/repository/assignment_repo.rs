// ==========================================
// Système Qualité Laboratoire - Affectations d'analyses
// ==========================================
// Accès à la table analyte_assignment: quelles analyses sont suivies
// pour les échantillons d'une fiche de saisie
// Le statut est écrit par les écrans de saisie; le moteur ne fait que lire
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sample::AnalyteAssignment;
use crate::domain::types::AssignmentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AnalyteAssignmentRepository - Affectations
// ==========================================
pub struct AnalyteAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AnalyteAssignmentRepository {
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

    /// Insère ou remplace une affectation
    pub fn upsert(&self, assignment: &AnalyteAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO analyte_assignment (form_id, analyte, status)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                assignment.form_id,
                assignment.analyte,
                assignment.status.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Affectations d'une fiche
    pub fn find_by_form(&self, form_id: &str) -> RepositoryResult<Vec<AnalyteAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE form_id = ?1 ORDER BY analyte",
            SELECT_ASSIGNMENT
        ))?;
        let assignments = stmt
            .query_map(params![form_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(assignments)
    }

    /// Toutes les affectations, groupées par fiche
    ///
    /// Utilisé par le recalcul en masse pour rapprocher chaque
    /// échantillon de la liste d'analyses de sa fiche en une lecture
    pub fn find_all_grouped(&self) -> RepositoryResult<HashMap<String, Vec<AnalyteAssignment>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY form_id, analyte",
            SELECT_ASSIGNMENT
        ))?;
        let assignments = stmt
            .query_map([], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut grouped: HashMap<String, Vec<AnalyteAssignment>> = HashMap::new();
        for assignment in assignments {
            grouped
                .entry(assignment.form_id.clone())
                .or_default()
                .push(assignment);
        }
        Ok(grouped)
    }

    /// Met à jour le statut d'une affectation (écrans de saisie)
    pub fn set_status(
        &self,
        form_id: &str,
        analyte: &str,
        status: AssignmentStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            "UPDATE analyte_assignment SET status = ?1 WHERE form_id = ?2 AND analyte = ?3",
            params![status.as_str(), form_id, analyte],
        )?;
        if count == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AnalyteAssignment".to_string(),
                id: format!("{}/{}", form_id, analyte),
            });
        }
        Ok(())
    }
}

const SELECT_ASSIGNMENT: &str = r#"
    SELECT form_id, analyte, status
    FROM analyte_assignment
"#;

fn map_assignment_row(row: &Row<'_>) -> SqliteResult<AnalyteAssignment> {
    Ok(AnalyteAssignment {
        form_id: row.get(0)?,
        analyte: row.get(1)?,
        status: AssignmentStatus::parse(&row.get::<_, String>(2)?),
    })
}
