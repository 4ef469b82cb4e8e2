use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Irregular plural -> singular.
static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("men", "man"), ("women", "woman"), ("children", "child"), ("feet", "foot"),
        ("teeth", "tooth"), ("geese", "goose"), ("mice", "mouse"), ("people", "people"),
        ("knives", "knife"), ("wives", "wife"), ("lives", "life"), ("leaves", "leaf"),
        ("halves", "half"), ("shelves", "shelf"), ("wolves", "wolf"), ("thieves", "thief"),
        ("data", "data"), ("criteria", "criterion"), ("phenomena", "phenomenon"),
        ("analyses", "analysis"), ("crises", "crisis"), ("bases", "basis"),
        ("indices", "index"), ("matrices", "matrix"), ("series", "series"),
        ("species", "species"), ("news", "news"), ("glasses", "glass"),
    ]
    .into_iter()
    .collect()
});

/// Words that end in "s" but are already base forms.
static SINGULAR_S: &[&str] = &[
    "bus", "gas", "plus", "status", "bonus", "virus", "canvas", "lens", "series", "chaos",
    "always", "perhaps", "thus", "yes", "various", "previous", "serious", "famous", "nervous",
    "obvious", "gorgeous", "tremendous", "delicious", "anxious", "curious", "less", "unless",
    "across", "towards", "afterwards", "ios", "os", "sms", "mrs", "whereas", "this", "his",
    "hers", "its", "us",
];

/// Suffix rewrites tried in order, mirroring the noun rules of a WordNet-style morphology.
const RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("zes", "z"),
    ("ies", "y"),
    ("men", "man"),
    ("s", ""),
];

/// Reduce a lowercase token to its noun base form.
pub fn lemmatize(token: &str) -> String {
    if token.len() <= 3 || token.chars().any(|c| c.is_ascii_digit()) {
        return token.to_string();
    }
    if let Some(base) = IRREGULAR.get(token) {
        return base.to_string();
    }
    if SINGULAR_S.contains(&token)
        || token.ends_with("ss")
        || token.ends_with("us")
        || token.ends_with("is")
        || token.ends_with("ous")
    {
        return token.to_string();
    }
    for (suffix, replacement) in RULES {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.len() >= 2 {
                return format!("{stem}{replacement}");
            }
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(lemmatize("machines"), "machine");
        assert_eq!(lemmatize("batteries"), "battery");
        assert_eq!(lemmatize("washes"), "wash");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("dresses"), "dress");
    }

    #[test]
    fn test_irregular_and_protected_forms() {
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("gorgeous"), "gorgeous");
        assert_eq!(lemmatize("9kg"), "9kg");
        assert_eq!(lemmatize("was"), "was");
    }
}
