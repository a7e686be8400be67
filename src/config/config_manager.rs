// ==========================================
// Système Qualité Laboratoire - Gestionnaire de configuration
// ==========================================
// Lecture/écriture de la configuration applicative
// Stockage: table config_kv (clé-valeur + portée)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// Clés de configuration
// ==========================================
pub mod config_keys {
    /// Taille de page du recalcul en masse
    pub const RECOMPUTE_PAGE_SIZE: &str = "recalcul/taille_page";
    /// Destinataire des alertes de non-conformité
    pub const ALERT_RECIPIENT: &str = "alertes/destinataire";
    /// Activation globale des alertes ("true"/"false")
    pub const ALERTS_ENABLED: &str = "alertes/actives";
}

// ==========================================
// ConfigManager - Gestionnaire de configuration
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Réutilise une connexion partagée
    ///
    /// Les PRAGMA unifiés sont réappliqués (idempotent) pour garantir
    /// un comportement homogène
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn
                .lock()
                .map_err(|e| format!("Verrou indisponible: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// Valeur de configuration en portée globale
    ///
    /// # Retour
    /// - Some(String): clé présente
    /// - None: clé absente (le défaut code s'applique chez l'appelant)
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Verrou indisponible: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Écrit une valeur de configuration en portée globale
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Verrou indisponible: {}", e))?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // Lectures typées
    // ==========================================

    /// Taille de page du recalcul (None si non configurée)
    pub fn recompute_page_size(&self) -> Result<Option<usize>, Box<dyn Error>> {
        let raw = self.get_config_value(config_keys::RECOMPUTE_PAGE_SIZE)?;
        Ok(raw.and_then(|v| v.trim().parse::<usize>().ok()))
    }

    /// Destinataire des alertes de non-conformité
    pub fn alert_recipient(&self) -> Result<Option<String>, Box<dyn Error>> {
        let raw = self.get_config_value(config_keys::ALERT_RECIPIENT)?;
        Ok(raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    /// Les alertes sont-elles actives (défaut: oui)
    pub fn alerts_enabled(&self) -> Result<bool, Box<dyn Error>> {
        let raw = self.get_config_value(config_keys::ALERTS_ENABLED)?;
        Ok(match raw.as_deref().map(str::trim) {
            Some("false") | Some("0") | Some("non") => false,
            _ => true,
        })
    }
}
