use std::path::{Path, PathBuf};

use super::error::ShareError;

/// Confines caller-supplied paths to a single shared root.
///
/// The root is injected at construction rather than read from process-wide
/// state, so tests can run against throwaway directories. Containment is
/// decided on canonical paths compared component-wise (`Path::starts_with`),
/// never on string prefixes: for root `/a/Shared`, the sibling
/// `/a/SharedEvil/x` must be rejected.
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`, creating the directory if missing and
    /// canonicalizing it once up front.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ShareError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)
            .map_err(|e| ShareError::Create(format!("shared root {}: {e}", root.display())))?;
        let root = root
            .canonicalize()
            .map_err(|e| ShareError::Create(format!("shared root {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw caller path to a canonical path inside the root.
    ///
    /// Absent or empty input resolves to the root itself. Relative input is
    /// taken relative to the root. Symlinks and `..`/`.` segments are fully
    /// resolved before the containment check, so a link pointing outside the
    /// root fails `PathEscape` even though its own path looks contained.
    pub fn resolve(&self, raw: Option<&str>) -> Result<PathBuf, ShareError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(self.root.clone()),
            Some(r) => r,
        };
        let candidate = PathBuf::from(raw);
        let joined = if candidate.is_absolute() {
            candidate
        } else {
            self.root.join(candidate)
        };
        let resolved = canonicalize_allowing_missing_tail(&joined)?;
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(ShareError::PathEscape)
        }
    }
}

/// Canonicalize a path whose final components may not exist yet (upload and
/// folder-create targets). The deepest existing ancestor is canonicalized,
/// then the missing tail is re-appended. The tail must consist of plain name
/// components: `..` or `.` past the existing portion would sidestep symlink
/// resolution, so they are rejected outright.
fn canonicalize_allowing_missing_tail(path: &Path) -> Result<PathBuf, ShareError> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let mut tail = Vec::new();
    let mut current = path;
    loop {
        let (parent, name) = match (current.parent(), current.file_name()) {
            (Some(p), Some(n)) => (p, n),
            // file_name() is None for a `..` component; parent() is None once
            // the filesystem root is consumed without resolving.
            _ => return Err(ShareError::PathEscape),
        };
        tail.push(name.to_os_string());
        match parent.canonicalize() {
            Ok(base) => {
                let mut out = base;
                for name in tail.iter().rev() {
                    out.push(name);
                }
                return Ok(out);
            }
            Err(_) => current = parent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard_in(dir: &Path) -> PathGuard {
        PathGuard::new(dir.join("Shared")).unwrap()
    }

    #[test]
    fn test_empty_input_resolves_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        assert_eq!(guard.resolve(None).unwrap(), guard.root());
        assert_eq!(guard.resolve(Some("")).unwrap(), guard.root());
        assert_eq!(guard.resolve(Some("   ")).unwrap(), guard.root());
    }

    #[test]
    fn test_relative_path_stays_inside() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        std::fs::create_dir(guard.root().join("docs")).unwrap();
        let resolved = guard.resolve(Some("docs")).unwrap();
        assert_eq!(resolved, guard.root().join("docs"));
    }

    #[test]
    fn test_missing_target_is_allowed_inside_root() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        let resolved = guard.resolve(Some("new-folder")).unwrap();
        assert_eq!(resolved, guard.root().join("new-folder"));
    }

    #[test]
    fn test_dotdot_escape_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        assert!(matches!(
            guard.resolve(Some("../outside")),
            Err(ShareError::PathEscape)
        ));
        assert!(matches!(
            guard.resolve(Some("docs/../../outside")),
            Err(ShareError::PathEscape)
        ));
    }

    #[test]
    fn test_absolute_outside_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        assert!(matches!(
            guard.resolve(Some("/etc/passwd")),
            Err(ShareError::PathEscape)
        ));
    }

    #[test]
    fn test_sibling_name_prefix_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        let evil = tmp.path().join("SharedEvil");
        std::fs::create_dir_all(evil.join("x")).unwrap();
        let raw = evil.join("x");
        assert!(matches!(
            guard.resolve(Some(raw.to_str().unwrap())),
            Err(ShareError::PathEscape)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        let outside = tmp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, guard.root().join("sneaky")).unwrap();
        assert!(matches!(
            guard.resolve(Some("sneaky")),
            Err(ShareError::PathEscape)
        ));
        assert!(matches!(
            guard.resolve(Some("sneaky/file.txt")),
            Err(ShareError::PathEscape)
        ));
    }

    #[test]
    fn test_dotdot_in_missing_tail_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = guard_in(tmp.path());
        // `nope` does not exist, so `..` after it cannot be resolved against
        // the filesystem and must not be trusted lexically.
        assert!(matches!(
            guard.resolve(Some("nope/../../../etc")),
            Err(ShareError::PathEscape)
        ));
    }
}
