//! Collision-free naming.

use std::path::{Path, PathBuf};

/// Upper bound on numeric suffixes tried before giving up.
const MAX_SUFFIX: u32 = 100_000;

/// Return `path` if `taken` rejects it, otherwise the first free
/// `stem_N.ext` sibling (N = 1, 2, ...).
///
/// Returns `None` only if every suffix up to the limit is taken.
pub fn disambiguate(path: &Path, taken: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    if !taken(path) {
        return Some(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1..=MAX_SUFFIX)
        .map(|i| match &extension {
            Some(ext) => parent.join(format!("{stem}_{i}.{ext}")),
            None => parent.join(format!("{stem}_{i}")),
        })
        .find(|candidate| !taken(candidate))
}

/// Same as [`disambiguate`] for `/`-separated names inside a bundle.
pub fn disambiguate_name(name: &str, taken: impl Fn(&str) -> bool) -> Option<String> {
    disambiguate(Path::new(name), |p| taken(&p.to_string_lossy()))
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

/// Make a string safe to embed in a file name.
///
/// Keeps ASCII alphanumerics, `-` and `.`; lowercases; maps everything
/// else to `_`.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
