//! Glob matching for class and function names.

/// Check if a name matches a glob pattern.
/// `*` matches any sequence of characters, including none.
pub fn matches_glob(pattern: &str, name: &str) -> bool {
    let Some((head, tail)) = pattern.split_once('*') else {
        return pattern == name;
    };
    let Some(mut rest) = name.strip_prefix(head) else {
        return false;
    };

    let mut parts: Vec<&str> = tail.split('*').collect();
    let last = parts.pop().unwrap_or_default();
    for part in parts {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    // The suffix is matched against what the other parts left over.
    rest.ends_with(last)
}

/// Match an optional value: no pattern accepts everything, a pattern
/// rejects a missing value.
pub fn matches_optional(pattern: Option<&str>, value: Option<&str>) -> bool {
    match (pattern, value) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(pattern), Some(value)) => matches_glob(pattern, value),
    }
}
