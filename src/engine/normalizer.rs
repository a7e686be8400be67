// ==========================================
// Système Qualité Laboratoire - Normaliseur de libellés
// ==========================================
// Transforme un libellé d'analyse saisi librement en clés de recherche
// canoniques, essayées dans l'ordre par le résolveur (premier match gagne)
// Règle d'or: transformation de chaîne pure, sans effet de bord
// ==========================================
// Centralise les substitutions de synonymes historiquement dispersées
// dans les écrans: "&" <-> "et", variantes datées des levures/moisissures,
// repli insensible aux espaces et à la casse
// ==========================================

// Suffixes datés des levures/moisissures (lecture à 3 et 5 jours)
const YEAST_MOLD_DELAYS: [&str; 2] = ["(3 jours)", "(5 jours)"];

// ==========================================
// NameNormalizer - Normaliseur de libellés
// ==========================================
pub struct NameNormalizer;

impl NameNormalizer {
    /// Clés candidates pour un libellé, par ordre de priorité
    ///
    /// # Règles
    /// 1. le libellé exact (épuré des espaces de bord)
    /// 2. substitutions de synonymes documentées: "&" et "/" valent "et"
    /// 3. libellé sans suffixe parenthésé (repli des variantes datées)
    /// 4. variantes datées 3/5 jours pour les levures/moisissures
    ///    sans date explicite
    ///
    /// Le résolveur essaie chaque clé dans l'ordre contre la collection
    /// de règles actives et s'arrête au premier match
    ///
    /// # Paramètres
    /// - label: libellé d'analyse saisi
    ///
    /// # Retour
    /// - Vec<String>: clés candidates, sans doublon, ordre de priorité
    pub fn candidate_keys(label: &str) -> Vec<String> {
        let exact = label.trim().to_string();
        let mut keys: Vec<String> = Vec::new();
        push_unique(&mut keys, exact.clone());

        // Synonymes: esperluette et barre oblique valent "et"
        let with_et = exact.replace(" & ", " et ").replace('&', " et ");
        push_unique(&mut keys, collapse_spaces(&with_et));
        let slash_as_et = exact.replace('/', " et ");
        push_unique(&mut keys, collapse_spaces(&slash_as_et));

        // Repli des variantes parenthésées ("Entérobactéries (24h)" -> "Entérobactéries")
        if let Some(stripped) = strip_parenthetical(&exact) {
            push_unique(&mut keys, stripped.clone());
            if let Some(stripped_et) = strip_parenthetical(&collapse_spaces(&with_et)) {
                push_unique(&mut keys, stripped_et);
            }
        }

        // Variantes datées des levures/moisissures sans date explicite
        if Self::is_yeast_mold(label) && !exact.contains('(') {
            let base = collapse_spaces(&slash_as_et);
            for delay in YEAST_MOLD_DELAYS {
                push_unique(&mut keys, format!("{} {}", base, delay));
            }
        }

        keys
    }

    /// Forme de comparaison insensible aux espaces et à la casse
    ///
    /// Utilisée en dernier ressort par le résolveur pour rapprocher une
    /// clé candidate d'une clé de règle malgré les écarts de saisie
    pub fn fold(s: &str) -> String {
        collapse_spaces(s.trim()).to_lowercase()
    }

    /// Deux libellés désignent-ils la même analyse à la saisie près
    pub fn matches(candidate: &str, rule_key: &str) -> bool {
        candidate == rule_key || Self::fold(candidate) == Self::fold(rule_key)
    }

    /// Le libellé désigne-t-il une analyse levures/moisissures
    pub fn is_yeast_mold(label: &str) -> bool {
        let folded = Self::fold(label);
        folded.contains("levures") && folded.contains("moisissures")
    }
}

/// Réduit les suites d'espaces à un seul espace
fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Libellé sans son suffixe parenthésé terminal, s'il existe
fn strip_parenthetical(s: &str) -> Option<String> {
    let open = s.rfind('(')?;
    if !s.trim_end().ends_with(')') {
        return None;
    }
    let stripped = collapse_spaces(s[..open].trim());
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !key.is_empty() && !keys.contains(&key) {
        keys.push(key);
    }
}
