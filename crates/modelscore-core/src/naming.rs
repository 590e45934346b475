//! Deterministic column-name disambiguation.

/// Return `name`, or the first of `name.new`, `name.new2`, `name.new3`, ...
/// that is not in `taken`.
pub fn avoid_conflict<S: AsRef<str>>(taken: &[S], name: &str) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|item| item.as_ref() == candidate);
    if !is_taken(name) {
        return name.to_string();
    }

    let mut candidate = format!("{name}.new");
    let mut attempt = 1usize;
    while is_taken(&candidate) {
        attempt += 1;
        candidate = format!("{name}.new{attempt}");
    }
    candidate
}

/// Rename every entry of `names` that collides with `reserved` or with an
/// earlier entry. Output has the same length and order as `names`.
pub fn disambiguate<S: AsRef<str>>(reserved: &[S], names: &[String]) -> Vec<String> {
    let mut taken: Vec<String> = reserved.iter().map(|s| s.as_ref().to_string()).collect();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let resolved = avoid_conflict(&taken, name);
        taken.push(resolved.clone());
        out.push(resolved);
    }
    out
}
