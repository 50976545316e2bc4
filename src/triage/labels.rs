//! Deterministic label classification for pull requests.
//!
//! Each changed file is tested against an ordered table of rules; every rule
//! that fires contributes its label, and the per-file results are unioned
//! into the PR's label set. Classification is a pure function of
//! (filename, status, patch text) — no API calls, no state — so the whole
//! table can be exercised with plain unit tests.
//!
//! A rule's attributes AND together; patterns within one attribute OR
//! together. A rule that reads an attribute the file does not have (a patch
//! rule against a binary file, a package rule against a non-recipe path)
//! simply cannot fire.
//!
//! Content rules match only the diff's changed lines: patterns are anchored
//! to the `+`/`-` markers at line starts, so a declaration that merely
//! appears in surrounding context does not count as added or removed.
//!
//! Package-name rules form two independent axes, vendor and language, and
//! within the language axis the first matching convention wins — a name is
//! never classified as two ecosystems.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::changes::{ChangeSetEntry, FileStatus};

/// One entry in the classification table.
struct LabelRule {
    /// The label this rule contributes.
    label: &'static str,

    /// Path patterns; at least one must match when present.
    filename: Option<Vec<Regex>>,

    /// Path pattern that must NOT match (used by `core`, which is
    /// "everything outside the package repository").
    filename_excludes: Option<Regex>,

    /// Acceptable file statuses, when the rule is status-sensitive.
    status: Option<&'static [FileStatus]>,

    /// Whether the rule only applies to package recipe files.
    package_only: bool,

    /// Patch patterns; at least one must match the diff when present.
    patch: Option<Vec<Regex>>,
}

impl LabelRule {
    fn matches(&self, entry: &ChangeSetEntry) -> bool {
        if let Some(excluded) = &self.filename_excludes {
            if excluded.is_match(&entry.filename) {
                return false;
            }
        }

        if let Some(patterns) = &self.filename {
            if !patterns.iter().any(|p| p.is_match(&entry.filename)) {
                return false;
            }
        }

        if let Some(statuses) = self.status {
            if !statuses.contains(&entry.status) {
                return false;
            }
        }

        if self.package_only && entry.package_name().is_none() {
            return false;
        }

        if let Some(patterns) = &self.patch {
            let Some(patch) = entry.patch.as_deref().filter(|p| !p.is_empty()) else {
                return false;
            };
            if !patterns.iter().any(|p| p.is_match(patch)) {
                return false;
            }
        }

        true
    }
}

fn rule(label: &'static str) -> LabelRule {
    LabelRule {
        label,
        filename: None,
        filename_excludes: None,
        status: None,
        package_only: false,
        patch: None,
    }
}

fn regexes(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Package recipe path, duplicated from [`super::changes::PACKAGE_PATH`] as a
/// plain pattern string so the table below stays declarative.
const PACKAGE_FILE: &str = r"^var/spack/repos/builtin/packages/[^/]+/package\.py$";

/// The ordered classification table.
///
/// Order is documentation more than semantics — every firing rule
/// contributes, none shadows another — but tests iterate it in order and
/// the grouping mirrors the taxonomy: package status, directives and
/// functions (content rules), core areas, docs, CI, misc.
static RULES: LazyLock<Vec<LabelRule>> = LazyLock::new(|| {
    vec![
        // ── Package status ──────────────────────────────────────────────
        LabelRule {
            filename: Some(regexes(&[PACKAGE_FILE])),
            status: Some(&[FileStatus::Added]),
            ..rule("new-package")
        },
        LabelRule {
            filename: Some(regexes(&[PACKAGE_FILE])),
            status: Some(&[FileStatus::Modified, FileStatus::Renamed]),
            ..rule("update-package")
        },
        // ── Maintainer-list edits ───────────────────────────────────────
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^[+-] +maintainers\s*[=(]"])),
            ..rule("maintainers")
        },
        // ── Directives (added declarations) ─────────────────────────────
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +version\("])),
            ..rule("new-version")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +conflicts\("])),
            ..rule("conflicts")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +depends_on\("])),
            ..rule("dependencies")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +extends\("])),
            ..rule("extensions")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +provides\("])),
            ..rule("virtual-dependencies")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +patch\("])),
            ..rule("patch")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +variant\("])),
            ..rule("new-variant")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^\+ +resource\("])),
            ..rule("resources")
        },
        // ── Functions (added or removed definitions) ────────────────────
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^[+-] +def determine_spec_details\("])),
            ..rule("external-packages")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^[+-] +def libs\("])),
            ..rule("libraries")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^[+-] +def headers\("])),
            ..rule("headers")
        },
        LabelRule {
            package_only: true,
            patch: Some(regexes(&[r"(?m)^[+-] +def test_?.*\("])),
            ..rule("smoke-tests")
        },
        // ── Core areas ──────────────────────────────────────────────────
        LabelRule {
            filename_excludes: Some(Regex::new(r"^var").unwrap()),
            ..rule("core")
        },
        LabelRule {
            filename: Some(regexes(&[
                r"^lib/spack/spack/(architecture|operating_systems|platforms)",
            ])),
            ..rule("architecture")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/binary_distribution"])),
            ..rule("binary-packages")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/build_environment"])),
            ..rule("build-environment")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/build_systems"])),
            ..rule("build-systems")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/cmd/[^/]+\.py$"])),
            status: Some(&[FileStatus::Added]),
            ..rule("new-command")
        },
        LabelRule {
            filename: Some(regexes(&[
                r"^lib/spack/spack/cmd/[^/]+\.py$",
                r"^lib/spack/spack/test/cmd/[^/]+\.py$",
                r"^lib/spack/spack/test/(cmd_extension|commands)\.py$",
            ])),
            ..rule("commands")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/compiler"])),
            ..rule("compilers")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/directives"])),
            ..rule("directives")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/environment"])),
            ..rule("environments")
        },
        LabelRule {
            filename: Some(regexes(&[
                r"^lib/spack/spack/(fetch|url|util/url|util/web)",
            ])),
            ..rule("fetching")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/(spack|llnl)/util/lock"])),
            ..rule("locking")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/modules"])),
            ..rule("modules")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/stage"])),
            ..rule("stage")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/test"])),
            ..rule("tests")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/util", r"^lib/spack/llnl"])),
            ..rule("utilities")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/spack/version"])),
            ..rule("versions")
        },
        // ── Documentation ───────────────────────────────────────────────
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/docs"])),
            ..rule("documentation")
        },
        // ── GitHub / CI ─────────────────────────────────────────────────
        LabelRule {
            filename: Some(regexes(&[r"^\.github/actions"])),
            ..rule("actions")
        },
        LabelRule {
            filename: Some(regexes(&[r"^\.github/workflows"])),
            ..rule("workflow")
        },
        LabelRule {
            filename: Some(regexes(&[r"^\.gitignore"])),
            ..rule("git")
        },
        LabelRule {
            filename: Some(regexes(&[r"^\.flake8"])),
            ..rule("flake8")
        },
        LabelRule {
            filename: Some(regexes(&[r"^LICENSE"])),
            ..rule("licenses")
        },
        LabelRule {
            filename: Some(regexes(&[r"^share/spack/gitlab"])),
            ..rule("gitlab")
        },
        // ── Other ───────────────────────────────────────────────────────
        LabelRule {
            filename: Some(regexes(&[r"^etc/spack/defaults"])),
            ..rule("defaults")
        },
        LabelRule {
            filename: Some(regexes(&[r"^lib/spack/external"])),
            ..rule("vendored-dependencies")
        },
        LabelRule {
            filename: Some(regexes(&[r"sbang"])),
            ..rule("sbang")
        },
        LabelRule {
            filename: Some(regexes(&[r"[Dd]ockerfile$", r"^share/spack/docker"])),
            ..rule("docker")
        },
        LabelRule {
            filename: Some(regexes(&[r"^share/spack/.*\.(sh|csh|fish)$"])),
            ..rule("shell-support")
        },
    ]
});

/// Vendor axis: package names carrying a vendor marker.
static VENDOR_RULES: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| vec![("intel", Regex::new(r"intel").unwrap())]);

/// Language axis, in priority order: the first convention a name matches
/// decides its ecosystem label.
static LANGUAGE_RULES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        ("python", regexes(&[r"^python$", r"^py-"])),
        ("R", regexes(&[r"^r$", r"^r-"])),
    ]
});

/// Classifies one changed file.
pub fn classify_file(entry: &ChangeSetEntry) -> BTreeSet<&'static str> {
    let mut labels = BTreeSet::new();

    if let Some(name) = entry.package_name() {
        for (label, pattern) in VENDOR_RULES.iter() {
            if pattern.is_match(name) {
                labels.insert(*label);
            }
        }

        // first match wins within the language axis
        for (label, patterns) in LANGUAGE_RULES.iter() {
            if patterns.iter().any(|p| p.is_match(name)) {
                labels.insert(*label);
                break;
            }
        }
    }

    for rule in RULES.iter() {
        if rule.matches(entry) {
            labels.insert(rule.label);
        }
    }

    labels
}

/// Classifies a whole change set: the union of per-file label sets.
///
/// The result is duplicate-free and deterministically ordered, ready to be
/// submitted in a single add-labels call.
pub fn classify(entries: &[ChangeSetEntry]) -> BTreeSet<&'static str> {
    let mut labels = BTreeSet::new();
    for entry in entries {
        labels.extend(classify_file(entry));
    }
    labels
}
