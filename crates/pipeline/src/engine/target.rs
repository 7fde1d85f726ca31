//! Splits a request target into path, query and fragment.
//!
//! Handles the target forms of [RFC 9112 Section 3.2](https://www.rfc-editor.org/rfc/rfc9112#section-3.2):
//! origin-form (`/p?q`), absolute-form (`http://host/p?q`), authority-form
//! (`host:443`) and asterisk-form (`*`).

/// Components of a request target. Absent components are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetParts<'a> {
    pub path: Option<&'a str>,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

pub fn split_target(target: &str) -> TargetParts<'_> {
    if target == "*" {
        return TargetParts { path: Some(target), ..TargetParts::default() };
    }

    let (rest, fragment) = match target.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (target, None),
    };

    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };

    let path = if rest.starts_with('/') {
        Some(rest)
    } else if let Some((_, after_scheme)) = rest.split_once("://") {
        // absolute-form, the path starts after the authority
        match after_scheme.find('/') {
            Some(index) => Some(&after_scheme[index..]),
            None => Some("/"),
        }
    } else {
        // authority-form carries no path
        None
    };

    TargetParts { path, query, fragment }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form() {
        assert_eq!(split_target("/index.html"), TargetParts { path: Some("/index.html"), query: None, fragment: None });

        assert_eq!(
            split_target("/index/?a=1&b=2&a=3"),
            TargetParts { path: Some("/index/"), query: Some("a=1&b=2&a=3"), fragment: None }
        );

        assert_eq!(
            split_target("/a?x=1#sec"),
            TargetParts { path: Some("/a"), query: Some("x=1"), fragment: Some("sec") }
        );
    }

    #[test]
    fn question_mark_inside_fragment_is_not_a_query() {
        assert_eq!(split_target("/a#b?c"), TargetParts { path: Some("/a"), query: None, fragment: Some("b?c") });
    }

    #[test]
    fn empty_query() {
        assert_eq!(split_target("/a?"), TargetParts { path: Some("/a"), query: Some(""), fragment: None });
    }

    #[test]
    fn absolute_form() {
        assert_eq!(
            split_target("http://example.com/p/q?x=1"),
            TargetParts { path: Some("/p/q"), query: Some("x=1"), fragment: None }
        );

        assert_eq!(
            split_target("http://example.com?x=1"),
            TargetParts { path: Some("/"), query: Some("x=1"), fragment: None }
        );
    }

    #[test]
    fn authority_and_asterisk_form() {
        assert_eq!(split_target("example.com:443"), TargetParts::default());
        assert_eq!(split_target("*"), TargetParts { path: Some("*"), query: None, fragment: None });
    }
}
