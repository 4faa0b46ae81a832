use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Lowercases a name and strips the diacritics of Latin letters so that
/// "Águilas" and "aguilas" compare equal.
pub fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .collect()
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Case- and accent-insensitive ordering of display names. Names that fold
/// to the same key fall back to their raw form so the order stays total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold_name(a).cmp(&fold_name(b)).then_with(|| a.cmp(b))
}

/// Trims a free-text field, mapping blank input to `None`.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
        .is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("Águilas Doradas"), "aguilas doradas");
        assert_eq!(fold_name("  CAÑA "), "cana");
        assert_eq!(fold_name("Zürich"), "zurich");
    }

    #[test]
    fn test_compare_names_ignores_case_and_accents() {
        assert_eq!(compare_names("Águilas", "Bravas"), Ordering::Less);
        assert!(compare_names("águilas", "Aguilas").is_ne());
        assert_eq!(compare_names("Ébano", "Delfines"), Ordering::Greater);
        assert_eq!(compare_names("Tigres", "Tigres"), Ordering::Equal);
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  Cancha 3 ")), Some("Cancha 3".to_string()));
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(None), None);
    }

    #[test]
    fn test_email_helpers() {
        assert_eq!(normalize_email(" Admin@Liga.MX "), "admin@liga.mx");
        assert!(is_valid_email("admin@liga.mx"));
        assert!(!is_valid_email("admin"));
        assert!(!is_valid_email("admin @liga.mx"));
    }
}
