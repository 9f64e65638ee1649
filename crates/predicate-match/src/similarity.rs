use crate::normalize::normalize;

/// Levenshtein distance with unit costs, comparing characters case-insensitively.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Similarity of two device names in `[0, 1]`, computed on their normalized forms.
///
/// Two names that both normalize to `""` are identical (`1.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize(a), &normalize(b))
}

/// Same as [`similarity`] for inputs that are already normalized.
pub(crate) fn normalized_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("ABC", "abc"), 0);
    }

    #[test]
    fn identical_names_score_one() {
        assert_eq!(similarity("Sofia Influenza A+B FIA", "Sofia Influenza A+B FIA"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("+++", ""), 1.0);
    }

    #[test]
    fn case_and_punctuation_collapse() {
        assert_eq!(
            similarity("QuickVue Influenza A+B Test", "quickvue influenza a+b test"),
            1.0
        );
        assert!(similarity("BD Veritor Flu A+B", "BD Veritor Flu AB") >= 0.9);
    }

    #[test]
    fn score_is_scaled_by_longer_name() {
        // "sofia influenza test" vs "sofia influenza tost": one substitution over 20 chars
        let score = similarity("Sofia Influenza Test", "Sofia Influenza Tost");
        assert!((score - 0.95).abs() < 1e-9);

        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn is_symmetric() {
        let pairs = [
            ("BD Veritor Flu A+B", "bd veritor flu a b"),
            ("Sofia Influenza A+B FIA", "Sofia Influenza AB FIA Test"),
            ("", "Uploaded Device"),
            ("Ossicular Replacment", "Ossicular Replacement Prosthesis"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn stays_in_unit_interval() {
        let pairs = [("a", "zzzzzzzz"), ("QuickVue", "Veritor"), ("x", "x")];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
    }
}
