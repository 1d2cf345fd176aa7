use std::sync::LazyLock;

use regex::Regex;

static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static MULTI_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:Dokumente|Seite[ \t]*\d+[ \t]*von[ \t]*\d+|Seite[ \t]*\d+)[ \t]*$").unwrap()
});

/// Normalize one export record into the canonical text every extractor reads.
///
/// Steps run in a fixed order: encoding artifacts, whitespace runs, page
/// header/footer lines, then a final newline collapse and trim. The result is
/// a fixed point: cleaning it again changes nothing.
pub fn clean(content: &str) -> String {
    let text = content.replace(['\u{a0}', '\u{feff}'], " ");
    let text = text.trim();

    let text = MULTI_SPACE_RE.replace_all(text, " ");
    let text = text.replace(" \n", "\n");
    let text = MULTI_NEWLINE_RE.replace_all(&text, "\n");

    let text = BOILERPLATE_RE.replace_all(&text, "");

    MULTI_NEWLINE_RE.replace_all(&text, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_nbsp_and_bom() {
        assert_eq!(clean("\u{feff}Ein\u{a0}Titel"), "Ein Titel");
    }

    #[test]
    fn collapses_spaces_and_newlines() {
        assert_eq!(clean("a   b \n\n\nc"), "a b\nc");
    }

    #[test]
    fn strips_page_boilerplate() {
        let raw = "Dokumente\nSeite 1 von 12\nZeitung vom 01.02.2020, S. 1\nTitel\nseite 3\nText\nSEITE 4 VON 5";
        assert_eq!(clean(raw), "Zeitung vom 01.02.2020, S. 1\nTitel\nText");
    }

    #[test]
    fn boilerplate_needs_whole_line() {
        let raw = "Auf Seite 3 steht mehr\nDokumente und Akten";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn trailing_space_on_boilerplate_line() {
        assert_eq!(clean("Titel\nSeite 2  \nText"), "Titel\nText");
    }

    #[test]
    fn boilerplate_match_stays_on_one_line() {
        assert_eq!(clean("Text\nSeite\nDokumente\n12\nMehr Text"), "Text\nSeite\n12\nMehr Text");
        assert_eq!(clean("Text\nSeite\n3\nMehr Text"), "Text\nSeite\n3\nMehr Text");
    }

    #[test]
    fn indented_boilerplate_line() {
        assert_eq!(clean("Dokumente\n Seite 2\nText"), "Text");
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \n \u{a0}\n"), "");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "\u{feff}Dokumente\n  Zeitung  vom 01.02.2020,  S. 1 \n\n\nTitel\u{a0}\u{a0}\nSeite 1\nText \t \nQuelle: X\n",
            "a \n \n b\n\nSeite 3 von 4\n\n\nc  ",
            "nur eine Zeile",
            "\t\tEinrückung\n\tbleibt",
            "Text\nSeite\nDokumente\n12\nMehr Text",
            "Dokumente\n Seite 2\nText",
            "Dokumente\n\tSeite 2\t\nText",
        ];
        for s in samples {
            let once = clean(s);
            assert_eq!(clean(&once), once, "not a fixed point for {:?}", s);
        }
    }

    #[test]
    fn fixture_records_are_fixed_points() {
        let raw = std::fs::read_to_string("tests/fixtures/export.txt").unwrap();
        for doc in raw.split(crate::export::RECORD_DELIMITER) {
            let once = clean(doc);
            assert_eq!(clean(&once), once);
        }
    }
}
