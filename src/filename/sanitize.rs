//! Character level cleanup for filenames and display names.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

/// Anything that is not a word character, hyphen or dot.
static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-\w.]").expect("Failed to create regex pattern for disallowed characters"));

/// Pictographs, flag halves, and the keycap and emoji presentation selectors.
static RE_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Extended_Pictographic}|\p{Regional_Indicator}|\x{20E3}|\x{FE0F}")
        .expect("Failed to create regex pattern for emoji")
});

/// Return the clean version of a filename.
///
/// Surrounding whitespace is trimmed, spaces become underscores,
/// and everything except word characters, hyphens and dots is removed.
/// The filename is processed one grapheme at a time so emoji sequences are kept intact.
///
/// ```rust
/// use warehouse_utils::filename::clean_filename;
///
/// assert_eq!(clean_filename("information_you've_submitted_to_advertisers.json"), "information_youve_submitted_to_advertisers.json");
/// assert_eq!(clean_filename("🐮.json"), "🐮.json");
/// assert_eq!(clean_filename(""), "");
/// ```
#[must_use]
pub fn clean_filename(filename: &str) -> String {
    let no_spaces = filename.trim().replace(' ', "_");
    no_spaces
        .graphemes(true)
        .map(|grapheme| {
            if is_emoji(grapheme) {
                grapheme.into()
            } else {
                RE_DISALLOWED.replace_all(grapheme, "")
            }
        })
        .collect()
}

/// Remove accents by decomposing characters and dropping the combining marks.
///
/// ```rust
/// use warehouse_utils::filename::fold_diacritics;
///
/// assert_eq!(fold_diacritics("Gonçalo Miranda"), "Goncalo Miranda");
/// ```
#[must_use]
pub fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Repair text where UTF-8 bytes were decoded as Windows-1252.
///
/// Returns the input unchanged when it does not look mis-encoded.
///
/// ```rust
/// use warehouse_utils::filename::fix_mis_encoded;
///
/// assert_eq!(fix_mis_encoded("GonÃ§alo"), "Gonçalo");
/// assert_eq!(fix_mis_encoded("Gonçalo"), "Gonçalo");
/// ```
#[must_use]
pub fn fix_mis_encoded(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let (bytes, _, had_unmappable) = encoding_rs::WINDOWS_1252.encode(text);
    if had_unmappable {
        return text.to_string();
    }
    match std::str::from_utf8(&bytes) {
        Ok(repaired) => repaired.to_string(),
        Err(_) => text.to_string(),
    }
}

/// Convert a person's display name to an ASCII-safe folder name.
///
/// ```rust
/// use warehouse_utils::filename::name_to_folder_name;
///
/// assert_eq!(name_to_folder_name("Gonçalo Miranda"), "goncalo_miranda");
/// ```
#[must_use]
pub fn name_to_folder_name(name: &str) -> String {
    clean_filename(&fold_diacritics(&fix_mis_encoded(name))).to_lowercase()
}

/// Check if a grapheme cluster is an emoji.
///
/// ```rust
/// use warehouse_utils::filename::is_emoji;
///
/// assert!(is_emoji("🐮"));
/// assert!(is_emoji("\u{25FE}"));
/// assert!(!is_emoji("\u{2713}"));
/// ```
#[must_use]
pub fn is_emoji(grapheme: &str) -> bool {
    RE_EMOJI.is_match(grapheme)
}

#[cfg(test)]
mod clean_filename_tests {
    use super::*;

    #[test]
    fn removes_apostrophes() {
        assert_eq!(
            clean_filename("information_you've_submitted_to_advertisers.json"),
            "information_youve_submitted_to_advertisers.json"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean_filename(""), "");
        assert_eq!(clean_filename("   "), "");
    }

    #[test]
    fn keeps_case() {
        assert_eq!(
            clean_filename("ContinuumSectionResponseV1_0.json"),
            "ContinuumSectionResponseV1_0.json"
        );
    }

    #[test]
    fn replaces_spaces() {
        assert_eq!(clean_filename("  my liked posts.json "), "my_liked_posts.json");
    }

    #[test]
    fn removes_punctuation() {
        assert_eq!(clean_filename("ads (1) & more!.csv"), "ads_1__more.csv");
        assert_eq!(clean_filename("a/b\\c:d.json"), "abcd.json");
    }

    #[test]
    fn keeps_hyphens_and_dots() {
        assert_eq!(clean_filename("todoist-filters_0000.json"), "todoist-filters_0000.json");
    }

    #[test]
    fn keeps_accented_letters() {
        assert_eq!(clean_filename("Gonçalo.json"), "Gonçalo.json");
    }

    #[test]
    fn keeps_emoji() {
        assert_eq!(clean_filename("🐮.json"), "🐮.json");
        assert_eq!(clean_filename("chat 🎉!.txt"), "chat_🎉.txt");
    }

    #[test]
    fn keeps_emoji_sequences_whole() {
        let family = "👨\u{200D}👩\u{200D}👧";
        assert_eq!(clean_filename(&format!("{family}.json")), format!("{family}.json"));

        let thumbs = "👍🏽";
        assert_eq!(clean_filename(&format!("{thumbs}'s.json")), format!("{thumbs}s.json"));

        let heart = "❤\u{FE0F}";
        assert_eq!(clean_filename(heart), heart);

        let keycap = "1\u{FE0F}\u{20E3}";
        assert_eq!(clean_filename(keycap), keycap);
    }

    #[test]
    fn keeps_emoji_outside_symbol_blocks() {
        assert_eq!(clean_filename("\u{25FE}.json"), "\u{25FE}.json");
        assert_eq!(clean_filename("\u{25FD} notes.txt"), "\u{25FD}_notes.txt");
    }

    #[test]
    fn removes_non_emoji_symbols() {
        assert_eq!(clean_filename("a\u{2713}.json"), "a.json");
        assert_eq!(clean_filename("done \u{2192} todo.csv"), "done__todo.csv");
    }

    #[test]
    fn keeps_flags() {
        let flag = "🇫🇮";
        assert_eq!(clean_filename(&format!("{flag} trip.json")), format!("{flag}_trip.json"));
    }
}

#[cfg(test)]
mod fold_diacritics_tests {
    use super::*;

    #[test]
    fn folds_names() {
        assert_eq!(fold_diacritics("Gonçalo Miranda"), "Goncalo Miranda");
        assert_eq!(fold_diacritics("Ångström Ölund"), "Angstrom Olund");
        assert_eq!(fold_diacritics("José Müller"), "Jose Muller");
    }

    #[test]
    fn folds_decomposed_input() {
        assert_eq!(fold_diacritics("Jose\u{301}"), "Jose");
    }

    #[test]
    fn ascii_is_unchanged() {
        assert_eq!(fold_diacritics("plain_name-1.json"), "plain_name-1.json");
        assert_eq!(fold_diacritics(""), "");
    }

    #[test]
    fn keeps_emoji() {
        assert_eq!(fold_diacritics("Zoë 🐮"), "Zoe 🐮");
    }
}
