use std::sync::LazyLock;

use regex::Regex;

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sRessort: (?P<section>[^;\n]*)").unwrap());

/// Department label from the `Ressort:` field of the source footer.
pub fn extract(text: &str) -> Option<String> {
    SECTION_RE
        .captures(text)
        .map(|caps| caps["section"].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_to_semicolon() {
        let text = "Quelle: SZ vom 12.03.2021, S. 5 Ressort: Wissen; Länge: 120 Wörter";
        assert_eq!(extract(text).as_deref(), Some("Wissen"));
    }

    #[test]
    fn up_to_newline() {
        assert_eq!(extract("Quelle: X Ressort: Politik \nMehr").as_deref(), Some("Politik"));
    }

    #[test]
    fn absent() {
        assert!(extract("Quelle: X; Länge: 3").is_none());
        assert!(extract("Ressort: am Anfang ohne Leerzeichen davor").is_none());
    }
}
