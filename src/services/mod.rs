// Services métier: chaque fonction reçoit explicitement l'id du propriétaire
// (owner_id) et ne lit/écrit que les lignes de cet utilisateur.

pub mod pricing;
pub mod period;
pub mod category_service;
pub mod product_service;
pub mod sale_service;
pub mod expense_service;
pub mod report_service;
pub mod dashboard_service;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Horodatage local (les colonnes DateTime sont naïves)
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    now().date()
}

/// Nettoie un nom saisi: espaces superflus retirés, chaque mot capitalisé
/// ("  café  da manhã " → "Café Da Manhã")
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Texte optionnel: chaîne vide → None
pub fn clean_optional(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Comparaison insensible à la casse, faite ici et non en SQL:
/// LOWER() de SQLite ne replie que l'ASCII ("Á" ≠ "á").
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Vrai si l'un des champs contient `needle` (casse ignorée)
pub fn text_matches(needle: &str, fields: &[Option<&str>]) -> bool {
    let needle = fold_case(needle);
    fields
        .iter()
        .flatten()
        .any(|field| fold_case(field).contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  café  da MANHÃ "), "Café Da Manhã");
        assert_eq!(normalize_name("x"), "X");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_text_matches_folds_unicode() {
        assert!(text_matches("água", &[Some("Água Mineral")]));
        assert!(text_matches("ÁGU", &[None, Some("água")]));
        assert!(text_matches("birthday", &[Some("Cake"), Some("BIRTHDAY order")]));
        assert!(!text_matches("tea", &[Some("Cake"), None]));
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" note ".into())), Some("note".into()));
        assert_eq!(clean_optional(None), None);
    }
}
