//! Change-set types and changed-package derivation.
//!
//! A pull request's change set is the list of files it touches, each with a
//! status and (for text changes) a unified-diff patch. The file list comes
//! straight off the GitHub list-files endpoint; this module owns the typed
//! representation and the package-path pattern shared by the label
//! classifier and the maintainer resolver.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches a package recipe path and captures the package name.
pub static PACKAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^var/spack/repos/builtin/packages/([^/]+)/package\.py$").unwrap()
});

/// Status of one file within a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    /// GitHub also reports `copied`, `changed`, and `unchanged`; none of the
    /// triage rules care which, so they collapse into one variant.
    #[serde(other)]
    Other,
}

/// One entry in a pull request's change set.
///
/// `patch` is absent for binary files and for removals; any rule that reads
/// the patch simply cannot fire for such entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetEntry {
    /// Path of the file relative to the repository root.
    pub filename: String,

    /// What happened to the file.
    pub status: FileStatus,

    /// The unified-diff patch text, when GitHub provides one.
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangeSetEntry {
    /// The package name, if this entry is a package recipe file.
    pub fn package_name(&self) -> Option<&str> {
        PACKAGE_PATH
            .captures(&self.filename)
            .map(|c| c.get(1).unwrap().as_str())
    }
}

/// Derives the set of packages a change set touches.
///
/// Entries with `removed` status are excluded: a deleted package can no
/// longer be queried for maintainers. Order follows first appearance in the
/// change set; duplicates (several files under one package) collapse.
pub fn changed_packages(entries: &[ChangeSetEntry]) -> Vec<String> {
    let mut packages = Vec::new();
    for entry in entries {
        if entry.status == FileStatus::Removed {
            continue;
        }
        if let Some(name) = entry.package_name() {
            if !packages.iter().any(|p| p == name) {
                packages.push(name.to_string());
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(filename: &str, status: FileStatus) -> ChangeSetEntry {
        ChangeSetEntry {
            filename: filename.into(),
            status,
            patch: None,
        }
    }

    #[test]
    fn package_name_extracted_from_recipe_path() {
        let e = entry(
            "var/spack/repos/builtin/packages/py-numpy/package.py",
            FileStatus::Modified,
        );
        assert_eq!(e.package_name(), Some("py-numpy"));
    }

    #[test]
    fn non_recipe_paths_have_no_package() {
        for path in [
            "lib/spack/spack/cmd/install.py",
            "var/spack/repos/builtin/packages/foo/patches/fix.patch",
            "var/spack/repos/builtin/packages/package.py",
            "README.md",
        ] {
            assert_eq!(entry(path, FileStatus::Modified).package_name(), None);
        }
    }

    #[test]
    fn removed_packages_are_excluded() {
        let entries = vec![
            entry(
                "var/spack/repos/builtin/packages/foo/package.py",
                FileStatus::Removed,
            ),
            entry(
                "var/spack/repos/builtin/packages/bar/package.py",
                FileStatus::Added,
            ),
        ];

        assert_eq!(changed_packages(&entries), vec!["bar"]);
    }

    #[test]
    fn duplicate_packages_collapse_preserving_order() {
        let entries = vec![
            entry(
                "var/spack/repos/builtin/packages/zlib/package.py",
                FileStatus::Modified,
            ),
            entry(
                "var/spack/repos/builtin/packages/cmake/package.py",
                FileStatus::Modified,
            ),
            entry(
                "var/spack/repos/builtin/packages/zlib/package.py",
                FileStatus::Renamed,
            ),
        ];

        assert_eq!(changed_packages(&entries), vec!["zlib", "cmake"]);
    }

    #[test]
    fn wire_format_parses_github_file_entry() {
        let entry: ChangeSetEntry = serde_json::from_str(
            r#"{
                "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
                "filename": "var/spack/repos/builtin/packages/foo/package.py",
                "status": "added",
                "additions": 100,
                "deletions": 0,
                "changes": 100,
                "patch": "@@ -0,0 +1,5 @@\n+    version(\"1.0\")"
            }"#,
        )
        .unwrap();

        assert_eq!(entry.status, FileStatus::Added);
        assert_eq!(entry.package_name(), Some("foo"));
        assert!(entry.patch.is_some());
    }

    #[test]
    fn unknown_status_parses_as_other() {
        let entry: ChangeSetEntry =
            serde_json::from_str(r#"{ "filename": "a.txt", "status": "copied" }"#).unwrap();
        assert_eq!(entry.status, FileStatus::Other);
        assert_eq!(entry.patch, None);
    }
}
