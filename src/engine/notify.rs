// ==========================================
// Système Qualité Laboratoire - Notification d'alertes
// ==========================================
// Trait de remise d'alertes de non-conformité, défini côté moteur et
// implémenté par la couche de livraison (courriel / push)
// Inversion de dépendance: le moteur ne connaît pas le transport
// ==========================================
// Envoi "fire-and-forget": un échec de remise est journalisé en
// avertissement et ne bloque jamais le recalcul
// ==========================================

use crate::domain::alert::NonConformityAlert;
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

// ==========================================
// Trait de remise d'alertes
// ==========================================

/// Remise d'alertes de non-conformité
///
/// Le moteur définit le trait, la couche de livraison l'implémente
/// (adaptateur courriel en production, enregistreur en test)
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Remet une alerte au destinataire
    ///
    /// # Retour
    /// - `Ok(delivery_id)`: identifiant de remise (ou chaîne vide)
    /// - `Err`: échec de remise (non fatal pour l'appelant)
    async fn notify(
        &self,
        alert: NonConformityAlert,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// Remise no-op
///
/// Pour les contextes sans notification (tests unitaires, recalculs à blanc)
#[derive(Debug, Clone, Default)]
pub struct NoOpAlertNotifier;

#[async_trait]
impl AlertNotifier for NoOpAlertNotifier {
    async fn notify(
        &self,
        alert: NonConformityAlert,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            destinataire = %alert.recipient,
            echantillons = alert.samples.len(),
            "NoOpAlertNotifier: alerte ignorée"
        );
        Ok(String::new())
    }
}

/// Enveloppe optionnelle de notification
///
/// Simplifie l'usage de `Option<Arc<dyn AlertNotifier>>`
pub struct OptionalAlertNotifier {
    inner: Option<Arc<dyn AlertNotifier>>,
}

impl OptionalAlertNotifier {
    pub fn with_notifier(notifier: Arc<dyn AlertNotifier>) -> Self {
        Self {
            inner: Some(notifier),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// Remet l'alerte si un notificateur est configuré
    pub async fn notify(
        &self,
        alert: NonConformityAlert,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(notifier) => notifier.notify(alert).await,
            None => {
                tracing::debug!("OptionalAlertNotifier: aucun notificateur configuré, alerte ignorée");
                Ok(String::new())
            }
        }
    }
}

impl Default for OptionalAlertNotifier {
    fn default() -> Self {
        Self::none()
    }
}
