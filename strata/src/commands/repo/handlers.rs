use super::*;
use crate::context::{AppContext, VerbosityLevel};
use crate::format::{self, OutputFormat};

fn exit_with(ctx: &AppContext, message: &str) -> ! {
    ctx.out.error(message);
    std::process::exit(1);
}

fn print_rows<T>(ctx: &AppContext, rows: &[T], format: OutputFormat)
where
    T: Serialize + Tabled,
{
    match format::format_table(rows, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => exit_with(ctx, &e),
    }
}

/// Handle the repo list command
pub fn handle_repo_list(ctx: &AppContext, format: OutputFormat) {
    let mut registry = ctx.registry().unwrap_or_else(|e| exit_with(ctx, &e));
    let repos = list_repos(&mut registry).unwrap_or_else(|e| exit_with(ctx, &e));
    print_rows(ctx, &repos, format);
}

/// Handle the repo fetch command
///
/// Exits non-zero if any repository failed to fetch.
pub fn handle_repo_fetch(ctx: &AppContext, name: Option<&str>, all: bool, format: OutputFormat) {
    let mut registry = ctx.registry().unwrap_or_else(|e| exit_with(ctx, &e));
    let targets = fetch_targets(&registry, name, all).unwrap_or_else(|e| exit_with(ctx, &e));

    let mut outcomes = Vec::new();
    for target in &targets {
        let spinner = ctx.out.spinner(&format!("Fetching {}...", target));
        let outcome = fetch_repo(&mut registry, target);
        match (&outcome.status, format) {
            (FetchStatus::Failed(e), OutputFormat::Pretty) => {
                spinner.finish_and_clear();
                ctx.out.error(&format!("{}: {}", target, e));
            }
            (status, OutputFormat::Pretty) => {
                ctx.out
                    .finish_progress(spinner, &format!("{}: {}", target, status));
                if ctx.verbosity >= VerbosityLevel::Verbose
                    && let Ok(repo) = registry.repo(Some(target.as_str()))
                {
                    println!("  index: {}", repo.index_path().display());
                }
            }
            _ => spinner.finish_and_clear(),
        }
        outcomes.push(outcome);
    }

    if format != OutputFormat::Pretty {
        print_rows(ctx, &outcomes, format);
    }

    if outcomes
        .iter()
        .any(|outcome| matches!(outcome.status, FetchStatus::Failed(_)))
    {
        std::process::exit(1);
    }
}

/// Handle the repo orphans command
pub fn handle_repo_orphans(ctx: &AppContext, name: Option<&str>, format: OutputFormat) {
    let mut registry = ctx.registry().unwrap_or_else(|e| exit_with(ctx, &e));
    let orphans = find_orphans(&mut registry, name).unwrap_or_else(|e| exit_with(ctx, &e));

    if orphans.is_empty() && format == OutputFormat::Pretty {
        println!("No orphaned image files.");
        return;
    }
    print_rows(ctx, &orphans, format);
}
