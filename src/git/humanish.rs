/// Derive the local directory name git would pick for a clone of `url`.
///
/// Applies, in order: drop one trailing `/`; drop a trailing `.git` along
/// with any `/` and `:` immediately before it; keep what follows the last
/// `/` or `:`.
pub fn humanish(url: &str) -> String {
    let s = url.strip_suffix('/').unwrap_or(url);

    let s = match s.strip_suffix(".git") {
        Some(rest) => rest.trim_end_matches('/').trim_end_matches(':'),
        None => s,
    };

    match s.rfind(|c: char| c == '/' || c == ':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.to_string(),
    }
}
