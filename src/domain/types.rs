// ==========================================
// Système Qualité Laboratoire - Types du domaine
// ==========================================
// Verdict échantillon, statut par analyse, opérateurs de seuil
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Verdict (conformité échantillon)
// ==========================================
// Format en base: "Conforme" / "Non-conforme" (colonnes historiques)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Conforme")]
    Conforme,
    #[serde(rename = "Non-conforme")]
    NonConforme,
}

impl Verdict {
    /// Représentation stockée en base
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Conforme => "Conforme",
            Verdict::NonConforme => "Non-conforme",
        }
    }

    /// Lecture depuis la colonne verdict (tolère les variantes historiques)
    pub fn parse(s: &str) -> Option<Verdict> {
        match s.trim() {
            "Conforme" | "CONFORME" => Some(Verdict::Conforme),
            "Non-conforme" | "Non conforme" | "NON-CONFORME" => Some(Verdict::NonConforme),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Statut par analyse (Analyte Status)
// ==========================================
// Le statut SANS_REGLE est neutre: affiché en couleur informative,
// jamais compté comme non-conformité
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyteStatus {
    Valid,   // Valeur dans le seuil
    Invalid, // Valeur hors seuil
    NoRule,  // Aucune règle applicable (neutre)
}

impl fmt::Display for AnalyteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyteStatus::Valid => write!(f, "VALID"),
            AnalyteStatus::Invalid => write!(f, "INVALID"),
            AnalyteStatus::NoRule => write!(f, "NO_RULE"),
        }
    }
}

// ==========================================
// Opérateur de seuil
// ==========================================
// Format en base: "<", "<=", ">", ">=", "=", "between"
// Un opérateur inconnu en base n'est JAMAIS deviné: il est traité
// comme absence de règle par le comparateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "between")]
    Between,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "=",
            Operator::Between => "between",
        }
    }

    /// Lecture depuis la colonne operator
    ///
    /// # Retour
    /// - Some(Operator): opérateur supporté
    /// - None: opérateur inconnu (=> pas de règle)
    pub fn parse(s: &str) -> Option<Operator> {
        match s.trim() {
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Le),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Ge),
            "=" | "==" => Some(Operator::Eq),
            "between" | "BETWEEN" => Some(Operator::Between),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Source de la règle résolue
// ==========================================
// Ordre de priorité de la résolution (4.4): surcharge contextuelle,
// espace environnemental, règle dynamique, table de repli
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleSource {
    ContextOverride, // Surcharge AJ/DLC fromage pasteurisé
    Zone,            // Règle de zone environnementale (Air Statique)
    Dynamic,         // Règle de seuil configurée
    Fallback,        // Table de repli embarquée
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::ContextOverride => write!(f, "CONTEXT_OVERRIDE"),
            RuleSource::Zone => write!(f, "ZONE"),
            RuleSource::Dynamic => write!(f, "DYNAMIC"),
            RuleSource::Fallback => write!(f, "FALLBACK"),
        }
    }
}

// ==========================================
// Stade de vie du produit (marqueur AJ/DLC)
// ==========================================
// AJ = analyse à J (jour de fabrication), DLC = analyse à date limite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShelfStage {
    Aj,
    Dlc,
}

impl ShelfStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfStage::Aj => "AJ",
            ShelfStage::Dlc => "DLC",
        }
    }

    pub fn parse(s: &str) -> Option<ShelfStage> {
        match s.trim() {
            "AJ" | "Aj" | "aj" => Some(ShelfStage::Aj),
            "DLC" | "Dlc" | "dlc" => Some(ShelfStage::Dlc),
            _ => None,
        }
    }
}

impl fmt::Display for ShelfStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Statut d'affectation d'analyse
// ==========================================
// Positionné par les écrans de saisie quand une mesure est enregistrée;
// le moteur ne fait que le lire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> AssignmentStatus {
        match s.trim() {
            "COMPLETED" | "completed" => AssignmentStatus::Completed,
            _ => AssignmentStatus::Pending,
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
