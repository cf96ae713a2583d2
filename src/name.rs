/// Join name parts with single spaces.
///
/// Absent or blank parts are skipped and each part is trimmed, so the result
/// never has leading, trailing or doubled spaces.
pub fn full_name(first: Option<&str>, middle: Option<&str>, last: Option<&str>) -> String {
    [first, middle, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_middle_name_skipped() {
        assert_eq!(full_name(Some("Jane"), Some(""), Some("Doe")), "Jane Doe");
        assert_eq!(full_name(Some("Jane"), Some("   "), Some("Doe")), "Jane Doe");
        assert_eq!(full_name(Some("Jane"), None, Some("Doe")), "Jane Doe");
    }

    #[test]
    fn test_all_parts() {
        assert_eq!(
            full_name(Some("Jane"), Some("Q"), Some("Doe")),
            "Jane Q Doe"
        );
    }

    #[test]
    fn test_missing_edges() {
        assert_eq!(full_name(None, Some("Q"), Some("Doe")), "Q Doe");
        assert_eq!(full_name(Some("Jane"), None, None), "Jane");
        assert_eq!(full_name(Some(" Jane "), None, Some(" Doe")), "Jane Doe");
        assert_eq!(full_name(None, None, None), "");
    }
}
