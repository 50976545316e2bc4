//! Maintainer resolution for changed packages.
//!
//! Determines which packages a PR touches, asks the injected
//! [`MaintainerLookup`] who maintains each, strips the PR author (nobody
//! reviews their own PR), and partitions the packages into "has maintainers"
//! and "has none". The production lookup is an ephemeral workspace checkout
//! ([`crate::workspace`]); tests inject an in-memory table.
//!
//! Two deliberate degradations:
//! - If the PR touches more than 100 packages, resolution is skipped
//!   entirely. A change that broad is infrastructural (a license sweep, an
//!   API migration), and mass-pinging maintainers would be noise.
//! - A lookup failure degrades that one package to "no maintainers" and the
//!   batch continues; one broken package must not block pings for the rest.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::workspace::WorkspaceError;

use super::changes::{changed_packages, ChangeSetEntry};

/// Above this many changed packages, resolution is skipped outright.
pub const MAX_TRIAGED_PACKAGES: usize = 100;

/// Capability to look up the declared maintainers of a package.
///
/// Injected so the resolver can be tested without a real checkout. The
/// production implementation clones the upstream repository into an
/// ephemeral workspace and queries the package metadata there — never the
/// PR's own code, which is untrusted.
pub trait MaintainerLookup: Send + Sync {
    fn resolve_maintainers(
        &self,
        package: &str,
    ) -> impl Future<Output = Result<BTreeSet<String>, WorkspaceError>> + Send;
}

/// The outcome of maintainer resolution for one pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintainerResolution {
    /// Packages that still have maintainers after removing the PR author,
    /// with those maintainers.
    pub maintained: BTreeMap<String, BTreeSet<String>>,

    /// Packages with no maintainers (including those whose only maintainer
    /// is the PR author).
    pub unmaintained: Vec<String>,

    /// Union of maintainers across all maintained packages.
    pub maintainers: BTreeSet<String>,
}

impl MaintainerResolution {
    pub fn is_empty(&self) -> bool {
        self.maintained.is_empty() && self.unmaintained.is_empty()
    }
}

/// Matches a `maintainers(...)` directive or `maintainers = [...]` list.
static MAINTAINER_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"maintainers(?:\(|\s*=\s*\[)[^\])]*(?:\)|\])").unwrap());

/// Matches one quoted handle inside a maintainer declaration.
static QUOTED_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

/// Extracts maintainers declared in the PR's own patch, per package.
///
/// A brand-new package is unknown to the upstream checkout, so the handles
/// it declares would otherwise be invisible. Parsing the diff text is safe;
/// executing code from the PR would not be — the bot is privileged and PR
/// code is untrusted.
pub fn parse_patch_maintainers(entries: &[ChangeSetEntry]) -> HashMap<String, BTreeSet<String>> {
    let mut result: HashMap<String, BTreeSet<String>> = HashMap::new();

    for entry in entries {
        let Some(package) = entry.package_name() else {
            continue;
        };
        let Some(patch) = entry.patch.as_deref() else {
            continue;
        };

        for declaration in MAINTAINER_DECL.find_iter(patch) {
            for capture in QUOTED_HANDLE.captures_iter(declaration.as_str()) {
                result
                    .entry(package.to_string())
                    .or_default()
                    .insert(capture[1].to_string());
            }
        }
    }

    result
}

/// Resolves maintainers for every package a change set touches.
///
/// The returned maintainer sets never contain `author`. Infallible by
/// design: per-package failures degrade to "no maintainers" (logged), and
/// the >100-package guard returns an empty resolution without invoking the
/// lookup at all.
pub async fn resolve<L: MaintainerLookup>(
    lookup: &L,
    entries: &[ChangeSetEntry],
    author: &str,
) -> MaintainerResolution {
    let packages = changed_packages(entries);

    if packages.len() > MAX_TRIAGED_PACKAGES {
        // Probably a license or API sweep, not a package change.
        info!(
            package_count = packages.len(),
            "too many changed packages, skipping maintainer resolution"
        );
        return MaintainerResolution::default();
    }

    let patch_maintainers = parse_patch_maintainers(entries);
    let mut resolution = MaintainerResolution::default();

    for package in packages {
        let mut maintainers = match lookup.resolve_maintainers(&package).await {
            Ok(found) => found,
            Err(e) => {
                warn!(package = %package, error = %e, "maintainer lookup failed, treating as unmaintained");
                BTreeSet::new()
            }
        };

        if let Some(from_patch) = patch_maintainers.get(&package) {
            maintainers.extend(from_patch.iter().cloned());
        }

        maintainers.remove(author);

        if maintainers.is_empty() {
            resolution.unmaintained.push(package);
        } else {
            resolution.maintainers.extend(maintainers.iter().cloned());
            resolution.maintained.insert(package, maintainers);
        }
    }

    resolution
}
