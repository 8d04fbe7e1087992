// src/commands.rs
//! Command handlers for the melpazoid CLI

use crate::cli::Commands;
use anyhow::{Context, Result};
use colored::Colorize;
use melpazoid::build::MakeBuildRunner;
use melpazoid::config::{ci_branch, Config};
use melpazoid::recipe::{package_name, tokenize, validate_recipe, Recipe};
use melpazoid::repository::{
    copy_local_repo, fetch_pull_request, fetch_recipe, find_pull_request, GithubMetadata,
    HttpClient, PullRequest, RemotePackageIndex, SourceFetcher,
};
use melpazoid::{ExitPolicy, Report, Submission, Validator};
use std::fs;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, warn};

/// Clipboard readers tried in order
const CLIPBOARD_TOOLS: &[&[&str]] = &[&["pbpaste"], &["wl-paste"], &["xclip", "-o", "-selection", "clipboard"]];

/// Shared state for one invocation
pub struct Session {
    config: Config,
    client: HttpClient,
    build: bool,
}

impl Session {
    pub fn new(config: Config, build: bool) -> Result<Self> {
        let client = HttpClient::new()?.with_token(config.github_token.clone());
        Ok(Self { config, client, build })
    }

    fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy::new(self.config.expect_error)
    }

    fn validator(&self) -> Validator {
        let mut validator = Validator::new(&self.config.build_dir)
            .with_metadata(GithubMetadata::new(self.client.clone()));

        if !self.config.exist_ok {
            validator = validator.with_index(RemotePackageIndex::new(self.client.clone()));
        }
        if self.build {
            if self.config.build_dir.join("Makefile").is_file() {
                validator = validator.with_builder(MakeBuildRunner::new(&self.config.build_dir));
            } else {
                warn!(
                    "No Makefile in {}, skipping the container build",
                    self.config.build_dir.display()
                );
            }
        }
        validator
    }
}

/// Run a command and return the process exit status
pub fn run(command: Commands, session: &Session) -> Result<i32> {
    match command {
        Commands::Recipe { recipe } => finish(session, &check_recipe(session, &recipe)),
        Commands::RecipeFile { path } => {
            let recipe = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read recipe file {}", path.display()))?;
            finish(session, &check_recipe(session, &recipe))
        }
        Commands::Pr { url } => finish(session, &check_pr(session, &url)),
        Commands::Watch => watch(session),
    }
}

fn finish(session: &Session, report: &Report) -> Result<i32> {
    print!("{}", report.render());
    Ok(session.exit_policy().exit_code(report))
}

/// Check a recipe, cloning its upstream repository
pub fn check_recipe(session: &Session, recipe: &str) -> Report {
    let mut report = Report::new();
    check_submission(session, recipe, None, &mut report);
    report
}

/// Check the recipe added by a MELPA pull request
pub fn check_pr(session: &Session, url: &str) -> Report {
    let mut report = Report::new();

    let Some((_, number)) = find_pull_request(url) else {
        report.fail(format!("{url} does not appear to be a MELPA PR"));
        return report;
    };
    let pull_request = match fetch_pull_request(&session.client, number) {
        Ok(pull_request) => pull_request,
        Err(e) => {
            report.fail(format!("{url} does not appear to be a MELPA PR: {e}"));
            return report;
        }
    };
    if pull_request.changed_files != 1 {
        report.fail("Only add one recipe per pull request");
        return report;
    }

    let (filename, recipe) = match fetch_recipe(&session.client, &pull_request) {
        Ok(Some(found)) => found,
        Ok(None) => {
            report.fail(format!("Unable to build the pull request at {url}"));
            return report;
        }
        Err(e) => {
            report.fail(format!("Unable to build the pull request at {url}: {e}"));
            return report;
        }
    };

    let name = tokenize(&recipe)
        .ok()
        .and_then(|tokens| package_name(&tokens).ok().map(str::to_string));
    match name {
        Some(name) if name != filename => {
            report.fail(format!("Recipe filename '{filename}' does not match '{name}'"));
        }
        _ => check_submission(session, &recipe, Some(&pull_request), &mut report),
    }
    report
}

/// Check one recipe, reporting every failure instead of returning it
fn check_submission(
    session: &Session,
    recipe_text: &str,
    pull_request: Option<&PullRequest>,
    report: &mut Report,
) {
    if let Err(e) = try_check_submission(session, recipe_text, pull_request, report) {
        report.fail(format!("Aborted: {e:#}"));
    }
}

fn try_check_submission(
    session: &Session,
    recipe_text: &str,
    pull_request: Option<&PullRequest>,
    report: &mut Report,
) -> Result<()> {
    if !validate_recipe(recipe_text) {
        report.fail(format!("Recipe '{recipe_text}' appears to be invalid"));
        return Ok(());
    }
    let recipe = match Recipe::parse(recipe_text) {
        Ok(recipe) => recipe,
        Err(e) => {
            report.fail(format!("Recipe '{recipe_text}' appears to be invalid: {e}"));
            return Ok(());
        }
    };

    let scratch = TempDir::new().context("Failed to create scratch directory")?;
    // package-build prefers the checkout to be named after the package
    let checkout = scratch.path().join(recipe.name());

    let clone_address = if let Some(local) = &session.config.local_repo {
        copy_local_repo(local, &checkout, report)?;
        None
    } else {
        let address = match recipe.clone_address() {
            Ok(address) => address,
            Err(e) => {
                report.fail(format!("- {e}"));
                return Ok(());
            }
        };
        let fetcher = match recipe.fetcher() {
            Ok(fetcher) => fetcher,
            Err(e) => {
                report.fail(format!("Recipe '{recipe_text}' appears to be invalid: {e}"));
                return Ok(());
            }
        };
        let branch = recipe.branch().map(str::to_string).or_else(|| ci_branch_override(report));

        let fetched = SourceFetcher::new(session.client.clone()).clone_into(
            &fetcher,
            &address,
            branch.as_deref(),
            &checkout,
            report,
        )?;
        if !fetched {
            return Ok(());
        }
        Some(address)
    };

    let mut submission = Submission::new(recipe_text, &checkout);
    if let Some(address) = clone_address.as_deref() {
        submission = submission.with_clone_address(address);
    }
    if let Some(pull_request) = pull_request {
        submission = submission.with_pull_request(pull_request);
    }

    match session.validator().run(&submission) {
        Ok(validation) => report.extend(validation.report),
        Err(e) => report.fail(format!("Aborted: {e}")),
    }
    Ok(())
}

/// Branch from the CI environment, only for recipes passed through `RECIPE`
fn ci_branch_override(report: &mut Report) -> Option<String> {
    std::env::var("RECIPE").ok()?;
    let branch = ci_branch(|key| std::env::var(key).ok())?;
    report.info(format!("CI workflow detected; using branch '{branch}'"));
    Some(branch)
}

/// Check every new MELPA pull request URL that shows up on the clipboard
fn watch(session: &Session) -> Result<i32> {
    let tool = CLIPBOARD_TOOLS
        .iter()
        .find(|tool| which::which(tool[0]).is_ok())
        .context("No clipboard reader found (tried pbpaste, wl-paste, xclip)")?;
    info!("Watching the clipboard with {}", tool[0]);

    let mut previous: Option<String> = None;
    loop {
        let output = Command::new(tool[0]).args(&tool[1..]).output();
        let clipboard = match output {
            Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
            Err(e) => {
                warn!("Failed to read the clipboard: {}", e);
                String::new()
            }
        };

        match find_pull_request(&clipboard) {
            Some((url, _)) if previous.as_deref() != Some(url.as_str()) => {
                println!("Found MELPA PR {url}");
                let report = check_pr(session, &url);
                print!("{}", report.render());
                if session.exit_policy().exit_code(&report) != 0 {
                    println!("{}", "<!-- This PR failed -->".red());
                } else {
                    println!("{}", "<!-- This PR passed -->".green());
                }
                println!("{}", "-".repeat(79));
                previous = Some(url);
            }
            _ => {
                eprint!("Watching clipboard for MELPA PR... \r");
                std::thread::sleep(Duration::from_secs(1));
            }
        }
    }
}
