/// Normalizes a desired tag list: trims each name, drops empties and
/// removes repeats while keeping first-seen order.
#[must_use]
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() || out.iter().any(|n| n == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_drops_empty() {
        assert_eq!(
            normalize_tag_names(&["  rust ", "", "   ", "db"]),
            vec!["rust".to_string(), "db".to_string()]
        );
    }

    #[test]
    fn test_normalize_dedupes() {
        assert_eq!(normalize_tag_names(&["a", " a", "b", "a "]), vec!["a", "b"]);
    }
}
