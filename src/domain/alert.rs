// ==========================================
// Système Qualité Laboratoire - Alerte de non-conformité
// ==========================================
// Charge utile envoyée au collaborateur de notification quand un
// échantillon bascule en Non-conforme (envoi "fire-and-forget":
// un échec de remise ne bloque jamais le recalcul)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// NonConformitySample - Échantillon signalé
// ==========================================
/// Ligne de détail d'une alerte: un échantillon non conforme et les
/// raisons par analyse qui ont déclenché le verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonConformitySample {
    pub sample_no: String,
    pub product_family: String,
    pub product_type: String,
    /// Raisons lisibles, une par analyse hors seuil
    pub reasons: Vec<String>,
}

// ==========================================
// NonConformityAlert - Alerte de non-conformité
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonConformityAlert {
    pub recipient: String,
    pub subject: String,
    pub samples: Vec<NonConformitySample>,
}

impl NonConformityAlert {
    /// Construit l'alerte standard du recalcul
    pub fn for_recompute(recipient: String, samples: Vec<NonConformitySample>) -> Self {
        let subject = format!(
            "Alerte qualité: {} échantillon(s) non conforme(s)",
            samples.len()
        );
        Self {
            recipient,
            subject,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_subject_counts_samples() {
        let alert = NonConformityAlert::for_recompute(
            "qualite@exemple.fr".to_string(),
            vec![NonConformitySample {
                sample_no: "2026-08-0042".to_string(),
                product_family: "GYMA 0%".to_string(),
                product_type: "Pot 500g".to_string(),
                reasons: vec!["Entérobactéries: 25 >= seuil < 10".to_string()],
            }],
        );
        assert!(alert.subject.contains("1 échantillon"));
        assert_eq!(alert.samples.len(), 1);
    }
}
