// src/search.rs

/// Minimum query length for suggestions; shorter fragments return nothing.
pub const MIN_QUERY_LEN: usize = 2;

/// How many candidates each source (titles, locations, category names)
/// contributes before ranking.
pub const PER_SOURCE_LIMIT: usize = 5;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 10;

/// Ranks gathered suggestion candidates for a query fragment.
///
/// Deduplicates, then orders prefix matches before merely-containing
/// matches, with shorter strings first within each group. Caps the result
/// at [`MAX_SUGGESTIONS`].
pub fn rank_suggestions(candidates: Vec<String>, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();

    let mut unique: Vec<String> = Vec::new();
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }

    unique.sort_by(|a, b| {
        let a_starts = a.to_lowercase().starts_with(&needle);
        let b_starts = b.to_lowercase().starts_with(&needle);
        b_starts
            .cmp(&a_starts)
            .then_with(|| a.len().cmp(&b.len()))
    });

    unique.truncate(MAX_SUGGESTIONS);
    unique
}

/// Case-insensitive substring test shared by both storage backends.
pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prefix_matches_rank_before_containing_matches() {
        let ranked = rank_suggestions(
            strings(&["Stary telefon", "Elektronika zestaw", "Elektronika"]),
            "el",
        );
        assert_eq!(
            ranked,
            strings(&["Elektronika", "Elektronika zestaw", "Stary telefon"])
        );
    }

    #[test]
    fn shorter_strings_win_ties() {
        let ranked = rank_suggestions(strings(&["Moda damska", "Moda"]), "mo");
        assert_eq!(ranked, strings(&["Moda", "Moda damska"]));
    }

    #[test]
    fn deduplicates_candidates() {
        let ranked = rank_suggestions(
            strings(&["Elektronika", "Elektronika", "Elektronika zestaw"]),
            "el",
        );
        assert_eq!(ranked, strings(&["Elektronika", "Elektronika zestaw"]));
    }

    #[test]
    fn caps_at_ten_results() {
        let candidates: Vec<String> = (0..15).map(|i| format!("Telefon model {i:02}")).collect();
        let ranked = rank_suggestions(candidates, "tel");
        assert_eq!(ranked.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(contains_ci("Elektronika zestaw", "elektro"));
        assert!(!contains_ci("Stary telefon", "elektro"));
    }
}
