//! Path helpers shared by the scanners

use std::path::{Component, Path, PathBuf};

/// Join a reference onto `base` and collapse `.` / `..` lexically.
///
/// References come from text documents written on any platform, so both `/`
/// and `\` separate components.
pub fn resolve(base: &Path, reference: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for part in reference.split(['/', '\\']) {
        if !part.is_empty() {
            joined.push(part);
        }
    }
    normalize(&joined)
}

/// Collapse `.` and `..` without touching the file system
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Path with `/` separators, prefix and root dropped
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Final path segment, for `/` or `\` separated archive paths
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lower-case extension without the dot, empty when there is none
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Whether any component of a root-relative path starts with a dot
pub fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_parent_segments() {
        let base = Path::new("/vam/Custom/Scripts/Author");
        assert_eq!(
            resolve(base, "Script.cs"),
            PathBuf::from("/vam/Custom/Scripts/Author/Script.cs")
        );
        assert_eq!(
            resolve(base, "../Other/./Lib.cs"),
            PathBuf::from("/vam/Custom/Scripts/Other/Lib.cs")
        );
        assert_eq!(
            resolve(Path::new("/vam"), "Custom\\Scripts\\Author\\Script.cs"),
            PathBuf::from("/vam/Custom/Scripts/Author/Script.cs")
        );
    }

    #[test]
    fn file_name_handles_both_separators() {
        assert_eq!(file_name("Custom/Scripts/Script.cs"), "Script.cs");
        assert_eq!(file_name("Custom\\Scripts\\Script.cs"), "Script.cs");
        assert_eq!(file_name("Script.cs"), "Script.cs");
    }

    #[test]
    fn hidden_components_are_detected() {
        assert!(is_hidden(Path::new("Custom/.git/config")));
        assert!(is_hidden(Path::new("Saves/.hidden.json")));
        assert!(!is_hidden(Path::new("Custom/Scripts/a.b.cs")));
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        assert_eq!(
            to_forward_slashes(Path::new("Custom/Scripts/Script.cs")),
            "Custom/Scripts/Script.cs"
        );
        assert_eq!(extension(Path::new("a/Script.CSLIST")), "cslist");
        assert_eq!(extension(Path::new("a/Makefile")), "");
    }
}
