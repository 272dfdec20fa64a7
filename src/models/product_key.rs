use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity for a product, derived from its (name, brand, model)
/// triple. Two records whose triples normalize to the same key are treated
/// as the same product across both stock pools.
///
/// Keys are always derived, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductKey(String);

impl ProductKey {
    /// Builds the canonical key for a product triple.
    ///
    /// Normalization: lowercase, diacritics folded (á→a, ñ→n, ...),
    /// whitespace runs collapsed, trimmed, and everything outside
    /// `[a-z0-9 -]` dropped. Deterministic and total; never fails.
    pub fn new(name: &str, brand: &str, model: &str) -> Self {
        let parts = [normalize(name), normalize(brand), normalize(model)];
        ProductKey(parts.join("|"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes a single component of a product triple.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        for folded in fold_char(ch) {
            if folded.is_whitespace() {
                pending_space = true;
                continue;
            }
            let folded = folded.to_ascii_lowercase();
            if !matches!(folded, 'a'..='z' | '0'..='9' | '-') {
                continue;
            }
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(folded);
        }
    }
    out
}

/// Folds accented Latin characters down to their ASCII base. The inventory
/// data is Spanish-language, so the closed Latin-1/Latin Extended-A set is
/// enough; anything else passes through and is filtered by `normalize`.
fn fold_char(ch: char) -> impl Iterator<Item = char> {
    let folded: &str = match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'ā' | 'Ā' => "a",
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' | 'ē' | 'Ē' => "e",
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' | 'ī' | 'Ī' => "i",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'ō' | 'Ō' => "o",
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' | 'ū' | 'Ū' => "u",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ý' | 'ÿ' | 'Ý' => "y",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        'ø' | 'Ø' => "o",
        _ => return FoldedChar::Keep(ch),
    };
    FoldedChar::Mapped(folded.chars())
}

enum FoldedChar {
    Keep(char),
    Mapped(std::str::Chars<'static>),
}

impl Iterator for FoldedChar {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match self {
            FoldedChar::Keep(ch) => {
                let ch = *ch;
                *self = FoldedChar::Mapped("".chars());
                Some(ch)
            }
            FoldedChar::Mapped(chars) => chars.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn folds_case_and_accents() {
        let a = ProductKey::new("Monitor Multiparámetros", "Mindray", "uMEC-12");
        let b = ProductKey::new("monitor multiparametros", "MINDRAY", "umec-12");
        assert_eq!(a, b);
    }

    #[test]
    fn collapses_whitespace_and_punctuation() {
        let a = ProductKey::new("  Bomba   de\tInfusión ", "B. Braun", "Infusomat®");
        let b = ProductKey::new("Bomba de Infusion", "B Braun", "Infusomat");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_models_stay_distinct() {
        let a = ProductKey::new("Concentrador", "Philips", "EverFlo");
        let b = ProductKey::new("Concentrador", "Philips", "SimplyGo");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_components_are_allowed() {
        let key = ProductKey::new("", "", "");
        assert_eq!(key.as_str(), "||");
    }

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize("Oxímetro  de Pulso"), "oximetro de pulso");
        assert_eq!(normalize("NIÑO/ADULTO"), "ninoadulto");
        assert_eq!(normalize("X-100"), "x-100");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalized_output_is_canonical(s in "\\PC*") {
            let out = normalize(&s);
            prop_assert!(out.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | ' ' | '-')));
            prop_assert!(!out.starts_with(' '));
            prop_assert!(!out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }

        #[test]
        fn key_ignores_case(name in "[a-zA-ZáéíóúñÁÉÍÓÚÑ ]{0,24}") {
            let upper = name.to_uppercase();
            prop_assert_eq!(
                ProductKey::new(&name, "brand", "model"),
                ProductKey::new(&upper, "brand", "model")
            );
        }
    }
}
