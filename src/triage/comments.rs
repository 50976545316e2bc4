//! Comment composition for maintainer pings.
//!
//! Exactly one comment per concern: one comment pinging maintainers who
//! cannot yet be requested as reviewers, and one separate comment for
//! packages that have no maintainer at all. The two are never merged and a
//! concern is never split across multiple comments.

use std::collections::{BTreeMap, BTreeSet};

/// Composes the comment pinging maintainers who needed a collaborator
/// invite, listing for each of them the packages that justify the ping.
///
/// `needs_invite` must be non-empty; callers skip the comment entirely when
/// there is nobody to ping.
pub fn reviewer_ping_comment(
    needs_invite: &[String],
    maintained: &BTreeMap<String, BTreeSet<String>>,
) -> String {
    let handles = needs_invite
        .iter()
        .map(|user| format!("@{user}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = Vec::new();
    for user in needs_invite {
        let packages: Vec<&str> = maintained
            .iter()
            .filter(|(_, maintainers)| maintainers.contains(user))
            .map(|(package, _)| package.as_str())
            .collect();
        lines.push(format!("* @{user}: `{}`", packages.join("`, `")));
    }

    format!(
        "{handles} can you review this PR?\n\n\
         This PR modifies the following package(s), for which you are listed as a maintainer:\n\n\
         {}\n",
        lines.join("\n")
    )
}

/// Composes the comment asking the PR author to find maintainers for
/// packages that have none, including the literal declaration snippet.
pub fn no_maintainers_comment(author: &str, unmaintained: &[String]) -> String {
    let mut packages = unmaintained.to_vec();
    packages.sort();

    let package_list = packages
        .iter()
        .map(|package| format!("* {package}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Hi @{author}! I noticed that the following package(s) don't yet have maintainers:\n\n\
         {package_list}\n\n\
         Are you interested in adopting any of these package(s)? If so, simply add the\n\
         following to the package class:\n\n\
         ```python\n    maintainers = [\"{author}\"]\n```\n\n\
         If not, could you contact the developers of these package(s) and see if they are\n\
         interested? A package can have multiple maintainers; just add a list of GitHub\n\
         handles of anyone who wants to volunteer. Please don't add maintainers without\n\
         their consent.\n"
    )
}
