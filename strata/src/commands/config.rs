use crate::config;
use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libstrata::{Config, RepoKind};

impl Formattable for Config {
    fn format_pretty(&self) -> String {
        let mut output = format!(
            "default_repo: {}\nnetwork.timeout: {}s\n",
            self.default_repo, self.network.timeout
        );

        if self.repos.is_empty() {
            output.push_str("\nNo repositories configured.\n");
            return output;
        }

        for (name, repo) in &self.repos {
            output.push_str(&format!("\n[{}]\n", name));
            let kind = match repo.kind {
                RepoKind::Local => "local",
                RepoKind::Remote => "remote",
            };
            output.push_str(&format!("type: {}\npath: {}\n", kind, repo.path));
            if let Some(ref url) = repo.url {
                output.push_str(&format!("url: {}\n", url));
            }
        }

        output
    }
}

/// Handle the config init subcommand
pub fn handle_init(ctx: &AppContext) {
    match config::init_config(&ctx.config_path) {
        Ok(_) => ctx.out.success(&format!(
            "Initialized config file at: {}",
            ctx.config_path.display()
        )),
        Err(e) => {
            ctx.out.error(&e);
            std::process::exit(1);
        }
    }
}

/// Handle the config show subcommand
///
/// Shows the resolved configuration, which is the fallback when no file exists.
pub fn handle_show(ctx: &AppContext, format: OutputFormat) {
    if !ctx.config_path.exists() {
        ctx.out.warning(&format!(
            "No config file at {}, showing built-in defaults",
            ctx.config_path.display()
        ));
    }

    match format::format_output(&ctx.config, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            ctx.out.error(&format!("formatting output: {}", e));
            std::process::exit(1);
        }
    }
}

/// Handle the config path subcommand
pub fn handle_path(ctx: &AppContext) {
    println!("{}", ctx.config_path.display());
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
