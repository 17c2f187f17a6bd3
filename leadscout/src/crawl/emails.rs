//! Email address pattern matching.

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Pattern for `local@domain.tld`-shaped addresses.
pub const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

/// Returns the compiled, case-insensitive email regex.
#[allow(clippy::expect_used)]
pub fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        RegexBuilder::new(EMAIL_PATTERN)
            .case_insensitive(true)
            .build()
            .expect("EMAIL_PATTERN is a valid regex")
    })
}

/// Finds every email address in `text`.
#[must_use]
pub fn find_emails(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_emails(text, &mut found);
    found
}

/// Adds every email address in `text` to `into`, returning how many were new.
pub fn collect_emails(text: &str, into: &mut BTreeSet<String>) -> usize {
    let before = into.len();
    into.extend(email_regex().find_iter(text).map(|m| m.as_str().to_string()));
    into.len() - before
}
