use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// True when an entry name could resolve outside the directory it is
/// extracted into: any `..` segment in either slash style, or an absolute
/// name (`/x`, `\x`, `C:...`).
pub fn is_traversal(name: &str) -> bool {
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return true;
    }

    let bytes = name.as_bytes();
    let drive_letter = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    name.starts_with('/') || name.starts_with('\\') || drive_letter
}

/// Lexically normalize a path: drop `.` and let `..` pop the previous
/// component. Never touches the filesystem.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Resolve an archive entry name below `root`.
///
/// Backslashes count as separators. Returns `None` when the normalized
/// result does not start with `root`.
pub fn resolve_within(root: &Utf8Path, entry_name: &str) -> Option<Utf8PathBuf> {
    let cleaned = entry_name.replace('\\', "/");
    let root = normalize(root);
    let resolved = normalize(&root.join(cleaned));
    resolved.starts_with(&root).then_some(resolved)
}
