// src/repository/pull_request.rs

//! MELPA pull requests
//!
//! A recipe submission is a pull request against melpa/melpa that adds a
//! single file under `recipes/`. The recipe text is recovered from the
//! unified diff rather than the branch, so forks need not be cloned.

use super::client::HttpClient;
use super::github::{RepoInfo, GITHUB_API};
use crate::error::Result;
use crate::report::{Diagnostic, Report, Severity};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;

/// Pattern of a MELPA pull request URL; group 1 is the number
pub const MELPA_PR_PATTERN: &str = r"https://github.com/melpa/melpa/pull/([0-9]+)";

static MELPA_PR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MELPA_PR_PATTERN).expect("valid pull request regex"));

/// The pull request fields the checks read
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub changed_files: u64,
    pub diff_url: String,
    pub user: PullRequestUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestUser {
    pub login: String,
}

/// First MELPA pull request URL in `text`, with its number
///
/// ```
/// use melpazoid::repository::find_pull_request;
///
/// let (url, number) = find_pull_request("see https://github.com/melpa/melpa/pull/6712 pls").unwrap();
/// assert_eq!(url, "https://github.com/melpa/melpa/pull/6712");
/// assert_eq!(number, 6712);
/// ```
pub fn find_pull_request(text: &str) -> Option<(String, u64)> {
    let caps = MELPA_PR_RE.captures(text)?;
    let number = caps[1].parse().ok()?;
    Some((caps[0].to_string(), number))
}

/// Fetch a MELPA pull request by number
pub fn fetch_pull_request(client: &HttpClient, number: u64) -> Result<PullRequest> {
    let url = format!("{GITHUB_API}/melpa/melpa/pulls/{number}");
    info!("Fetching {}", url);
    client.get_json(&url)
}

/// Recipe file name and recipe text added by a diff
///
/// Returns `None` unless the diff creates a file under `recipes/`.
pub fn recipe_from_diff(diff: &str) -> Option<(String, String)> {
    if !diff.contains("new file mode") || !diff.contains("a/recipes") || !diff.contains("b/recipes") {
        return None;
    }

    let filename = diff.lines().next()?.rsplit('/').next()?.trim().to_string();

    let recipe: Vec<&str> = diff
        .lines()
        .skip_while(|line| !line.starts_with("@@"))
        .skip(1)
        .filter_map(|line| line.strip_prefix('+'))
        .collect();
    let recipe = recipe.join("\n").trim().to_string();

    if filename.is_empty() || recipe.is_empty() {
        None
    } else {
        Some((filename, recipe))
    }
}

/// Download a pull request's diff and pull the recipe out of it
pub fn fetch_recipe(client: &HttpClient, pull_request: &PullRequest) -> Result<Option<(String, String)>> {
    let diff = client.get_text(&pull_request.diff_url)?;
    Ok(recipe_from_diff(&diff))
}

/// Collapse whitespace and put each keyword on its own line
///
/// ```
/// use melpazoid::repository::prettify_recipe;
///
/// assert_eq!(
///     prettify_recipe("(shx\n :repo \"riscy/shx-for-emacs\"   :fetcher github)"),
///     "(shx\n  :repo \"riscy/shx-for-emacs\"\n  :fetcher github)"
/// );
/// ```
pub fn prettify_recipe(recipe: &str) -> String {
    recipe
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" :", "\n  :")
}

/// `2018-06-09T21:37:56Z` -> `2018-06-09`
fn format_date(timestamp: &str) -> String {
    match timestamp.parse::<DateTime<Utc>>() {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.split('T').next().unwrap_or_default().to_string(),
    }
}

/// Reviewer notes appended to a pull request check
pub fn pr_footnotes(
    report: &mut Report,
    recipe: &str,
    clone_address: &str,
    pull_request: &PullRequest,
    repo_info: Option<&RepoInfo>,
) {
    report.push(
        Diagnostic::new(Severity::Info, "<!-- ### Footnotes ###").with_highlight("### Footnotes ###"),
    );
    report.info(format!("```\n{}\n```", prettify_recipe(recipe)));

    if let Some(info) = repo_info {
        if info.archived {
            report.fail("- GitHub repository is archived");
        }
        report.info(format!("- Watched: {}", info.watchers_count));
        report.info(format!(
            "- Created: {}",
            format_date(info.created_at.as_deref().unwrap_or_default())
        ));
        report.info(format!(
            "- Updated: {}",
            format_date(info.updated_at.as_deref().unwrap_or_default())
        ));
    }

    let login = &pull_request.user.login;
    report.info(format!("- PR by {login}: {clone_address}"));
    if !clone_address.to_lowercase().contains(&login.to_lowercase()) {
        report.warn("- NOTE: Repo and recipe owner don't match");
    }
    report.info("-->");
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "diff --git a/recipes/shx b/recipes/shx
new file mode 100644
index 0000000..1b2c3d4
--- /dev/null
+++ b/recipes/shx
@@ -0,0 +1,3 @@
+(shx
+ :repo \"riscy/shx-for-emacs\"
+ :fetcher github)
\\ No newline at end of file
";

    fn pull_request(login: &str) -> PullRequest {
        PullRequest {
            changed_files: 1,
            diff_url: "https://github.com/melpa/melpa/pull/1.diff".to_string(),
            user: PullRequestUser {
                login: login.to_string(),
            },
        }
    }

    #[test]
    fn test_recipe_from_diff() {
        let (filename, recipe) = recipe_from_diff(DIFF).unwrap();
        assert_eq!(filename, "shx");
        assert_eq!(recipe, "(shx\n :repo \"riscy/shx-for-emacs\"\n :fetcher github)");
    }

    #[test]
    fn test_modified_recipe_is_rejected() {
        let diff = DIFF.replace("new file mode 100644\n", "");
        assert_eq!(recipe_from_diff(&diff), None);
        assert_eq!(recipe_from_diff("diff --git a/README.md b/README.md\nnew file mode"), None);
    }

    #[test]
    fn test_pull_request_payload() {
        let json = r#"{"number": 1, "changed_files": 2, "diff_url": "https://x/1.diff",
                       "user": {"login": "riscy", "id": 7}}"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.changed_files, 2);
        assert_eq!(pr.user.login, "riscy");
    }

    #[test]
    fn test_footnotes() {
        let info = RepoInfo {
            archived: true,
            created_at: Some("2018-06-09T21:37:56Z".to_string()),
            updated_at: Some("2020-01-02T03:04:05Z".to_string()),
            watchers_count: 42,
            ..RepoInfo::default()
        };
        let mut report = Report::new();
        pr_footnotes(
            &mut report,
            "(shx :repo \"riscy/shx-for-emacs\" :fetcher github)",
            "https://github.com/riscy/shx-for-emacs.git",
            &pull_request("someone-else"),
            Some(&info),
        );

        let messages: Vec<&str> = report.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"- Created: 2018-06-09"));
        assert!(messages.contains(&"- Updated: 2020-01-02"));
        assert!(messages.contains(&"- Watched: 42"));
        assert!(report.failed());
        assert_eq!(report.count(Severity::Warning), 1);
        assert_eq!(messages.last(), Some(&"-->"));
    }

    #[test]
    fn test_footnotes_owner_match() {
        let mut report = Report::new();
        pr_footnotes(
            &mut report,
            "(shx :repo \"riscy/shx-for-emacs\" :fetcher github)",
            "https://github.com/riscy/shx-for-emacs.git",
            &pull_request("Riscy"),
            None,
        );
        assert_eq!(report.severity(), Severity::Info);
    }
}
