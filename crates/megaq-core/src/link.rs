//! Mega link validation.
//!
//! A link is accepted iff it matches `^(https?://)?mega\.nz/#.+$`: optional
//! scheme, host `mega.nz`, and a non-empty fragment path. Anything else on
//! the command line is treated as a list-file path, and anything else inside
//! a list file is rejected permanently.

/// A validated mega.nz link. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link(String);

impl Link {
    /// Parse a candidate string; returns `None` unless it is a valid link.
    pub fn parse(s: &str) -> Option<Link> {
        if is_valid_link(s) {
            Some(Link(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// True iff `s` is a downloadable mega.nz link. A multi-line string is never
/// a link: the fragment must not span past a newline.
pub fn is_valid_link(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s);
    match rest.strip_prefix("mega.nz/#") {
        Some(fragment) => !fragment.is_empty() && !fragment.contains('\n'),
        None => false,
    }
}
