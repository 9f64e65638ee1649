/// Literal spelling fixes applied after cleanup. Replacements must not contain
/// their own pattern, or normalization stops being idempotent.
const CORRECTIONS: &[(&str, &str)] = &[("replacment", "replacement")];

/// Canonical form of a device name for comparison.
///
/// Lower-cases, keeps only ASCII letters, digits and whitespace, collapses
/// whitespace runs to one space and trims, then applies [`CORRECTIONS`].
/// Punctuation is removed rather than replaced, so `"A+B"` becomes `"ab"`.
pub fn normalize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let lowercase = name.to_lowercase();
    let cleaned: String = lowercase
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let mut collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for (pattern, replacement) in CORRECTIONS {
        if collapsed.contains(pattern) {
            collapsed = collapsed.replace(pattern, replacement);
        }
    }

    collapsed
}
