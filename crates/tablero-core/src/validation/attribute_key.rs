//! Attribute key derivation.
//!
//! `key` is a pure function of `label`: lowercase, diacritics stripped,
//! non-alphanumeric runs collapsed to `_`, no leading/trailing `_`.

/// Map a Latin character with diacritics to its ASCII base letter.
/// Covers the characters that occur in the Spanish-language labels this
/// system is fed; anything else non-ASCII falls through as non-alphanumeric.
fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

/// Derive the machine name for an attribute from its label.
pub fn derive_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_separator = false;
    for c in label.to_lowercase().chars().map(strip_diacritic) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c);
        } else {
            pending_separator = true;
        }
    }
    key
}

/// Compose the stored item_type name: the user-facing type name suffixed
/// with the company name, e.g. "Apartamento" + "Acme" -> "Apartamento_Acme".
pub fn qualify_item_type(type_name: &str, company_name: &str) -> String {
    format!("{}_{}", type_name.trim(), company_name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_strips_diacritics() {
        assert_eq!(
            derive_key("Número de habitaciones"),
            "numero_de_habitaciones"
        );
        assert_eq!(derive_key("Año de construcción"), "ano_de_construccion");
    }

    #[test]
    fn test_derive_key_collapses_runs() {
        assert_eq!(derive_key("Precio  ($ / m2)"), "precio_m2");
        assert_eq!(derive_key("--Superficie--"), "superficie");
    }

    #[test]
    fn test_derive_key_pure_and_stable() {
        let label = "Tamaño (m²) útil";
        assert_eq!(derive_key(label), derive_key(label));
        assert_eq!(derive_key(label), "tamano_m_util");
    }

    #[test]
    fn test_derive_key_empty() {
        assert_eq!(derive_key(""), "");
        assert_eq!(derive_key("  ¿? "), "");
    }

    #[test]
    fn test_qualify_item_type() {
        assert_eq!(qualify_item_type("Apartamento", "Acme"), "Apartamento_Acme");
    }
}
