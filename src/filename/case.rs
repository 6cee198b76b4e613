//! CamelCase to snake_case conversion.

use std::sync::LazyLock;

use regex::Regex;

/// Uppercase letter that starts a lowercase word, preceded by anything.
/// Splits "XMLParser" into "XML_Parser" and "fooBar_Baz" into "foo_Bar__Baz".
static RE_WORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("Failed to create regex pattern for word start"));

/// Uppercase letter directly after a lowercase letter or digit.
static RE_LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Failed to create regex pattern for case boundary"));

/// Convert a CamelCase or mixed-case string to lowercase snake_case.
///
/// Existing underscores are kept as is,
/// so an underscore followed by a capitalized word produces a double underscore.
///
/// ```rust
/// use warehouse_utils::filename::camel_to_snake_case;
///
/// assert_eq!(camel_to_snake_case("HowWeFeelEmotions.csv"), "how_we_feel_emotions.csv");
/// assert_eq!(camel_to_snake_case("CacheRealmReport_Hourly_0.json"), "cache_realm_report__hourly_0.json");
/// assert_eq!(camel_to_snake_case("filters_0000.json"), "filters_0000.json");
/// ```
#[must_use]
pub fn camel_to_snake_case(text: &str) -> String {
    let words = RE_WORD_START.replace_all(text, "${1}_${2}");
    RE_LOWER_UPPER.replace_all(&words, "${1}_${2}").to_lowercase()
}
