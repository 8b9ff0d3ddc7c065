//! Helpers for normalizing class names.

use std::collections::HashSet;

/// Canonicalize a class name: trim, lowercase, then capitalize each
/// whitespace-delimited word.
pub fn canonicalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove duplicate entries while preserving first-seen order.
pub fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for name in names {
        if seen.insert(name.clone()) {
            unique.push(name);
        }
    }
    unique
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_trims_and_title_cases() {
        assert_eq!(canonicalize("  mATH 101  "), "Math 101");
        assert_eq!(canonicalize("art"), "Art");
        assert_eq!(canonicalize("ADVANCED bio"), "Advanced Bio");
    }

    #[test]
    fn canonicalize_collapses_inner_whitespace() {
        assert_eq!(canonicalize("home   economics"), "Home Economics");
    }

    #[test]
    fn canonicalize_handles_empty_input() {
        assert_eq!(canonicalize("   "), "");
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let names = vec!["Math".to_string(), "Math".to_string(), "Art".to_string()];
        assert_eq!(dedupe(names), vec!["Math".to_string(), "Art".to_string()]);
    }

    #[test]
    fn dedupe_after_canonicalize_collapses_case_variants() {
        let names: Vec<String> = ["Math", "math", "Art"]
            .iter()
            .map(|name| canonicalize(name))
            .collect();
        assert_eq!(dedupe(names), vec!["Math".to_string(), "Art".to_string()]);
    }
}
