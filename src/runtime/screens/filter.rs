/// Narrow a selection list to the entries containing `input`.
///
/// A missing or empty input leaves the list untouched. Matching is a
/// case-sensitive substring test and the original order is preserved.
pub fn filter_choices<S: AsRef<str>>(choices: &[S], input: Option<&str>) -> Vec<String> {
    match input {
        None | Some("") => choices.iter().map(|c| c.as_ref().to_string()).collect(),
        Some(needle) => choices
            .iter()
            .map(AsRef::as_ref)
            .filter(|choice| choice.contains(needle))
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["foo1".into(), "foo2".into(), "bar".into()]
    }

    #[test]
    fn missing_input_returns_everything() {
        assert_eq!(filter_choices(&names(), None), names());
    }

    #[test]
    fn empty_input_returns_everything() {
        assert_eq!(filter_choices(&names(), Some("")), names());
    }

    #[test]
    fn substring_match_preserves_order() {
        assert_eq!(filter_choices(&names(), Some("foo")), vec!["foo1", "foo2"]);
        assert_eq!(filter_choices(&names(), Some("2")), vec!["foo2"]);
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(filter_choices(&names(), Some("FOO")).is_empty());
    }

    #[test]
    fn works_on_borrowed_slices() {
        let ids = ["get-users:success", "get-users:error", "get-user:success"];
        assert_eq!(
            filter_choices(&ids, Some("users")),
            vec!["get-users:success", "get-users:error"]
        );
    }
}
