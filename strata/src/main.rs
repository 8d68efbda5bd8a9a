use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod context;
mod format;
mod logging;

/// Strata - Layered Disk Image Repositories
///
/// A CLI tool for importing, tagging and fetching content-addressed qcow2 images.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    /// Path to the configuration file
    #[arg(long, global = true, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },
    /// Import and explore images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ImageCommands {
    /// List images across all repositories
    #[command(visible_alias = "ls")]
    List {
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show only image names
        #[arg(short, long)]
        quiet: bool,
        /// Only list images of this repository
        #[arg(long)]
        repo: Option<String>,
    },
    /// Show details about an image
    Show {
        /// Image name (tag or id prefix, optionally `repo:` qualified)
        name: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Import a disk image file
    Import {
        /// Disk image file to import
        file: PathBuf,
        /// Parent image the new image is layered on
        #[arg(long)]
        parent: Option<String>,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Tag to point at the imported image
        #[arg(short, long)]
        tag: Option<String>,
        /// Target repository (defaults to the configured default)
        #[arg(long)]
        repo: Option<String>,
        /// qemu-img binary used to hash, convert and inspect images
        #[arg(long, env = "STRATA_QEMU_IMG", default_value = "qemu-img")]
        qemu_img: PathBuf,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Point a tag at an image
    Tag {
        /// Tag name, optionally `repo:` qualified
        tag: String,
        /// Image name the tag points at
        name: String,
    },
    /// Show the backing chain of an image
    Ancestors {
        /// Image name (tag or id prefix, optionally `repo:` qualified)
        name: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum RepoCommands {
    /// List configured repositories
    #[command(visible_alias = "ls")]
    List {
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Replace the local index of a remote repository with the remote one
    Fetch {
        /// Repository name (optional, uses default if omitted)
        name: Option<String>,
        /// Fetch every configured repository
        #[arg(long)]
        all: bool,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// List stored image files missing from the index
    Orphans {
        /// Repository name (optional, checks all if omitted)
        name: Option<String>,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Initialize configuration with default values
    Init,
    /// Display the resolved configuration
    Show {
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Print the configuration file path
    Path,
}

fn main() {
    let cli = Cli::parse();

    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    logging::init(verbosity);

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(
        cli.config,
        format::ColorChoice::from(cli.color.as_str()),
        verbosity,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init => commands::config::handle_init(&ctx),
            ConfigCommands::Show { format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::config::handle_show(&ctx, fmt);
            }
            ConfigCommands::Path => commands::config::handle_path(&ctx),
        },
        Commands::Repo { command } => match command {
            RepoCommands::List { format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::repo::handlers::handle_repo_list(&ctx, fmt);
            }
            RepoCommands::Fetch { name, all, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::repo::handlers::handle_repo_fetch(&ctx, name.as_deref(), all, fmt);
            }
            RepoCommands::Orphans { name, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::repo::handlers::handle_repo_orphans(&ctx, name.as_deref(), fmt);
            }
        },
        Commands::Image { command } => match command {
            ImageCommands::List {
                format,
                quiet,
                repo,
            } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::image::handlers::handle_image_list(&ctx, fmt, quiet, repo.as_deref());
            }
            ImageCommands::Show { name, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::image::handlers::handle_image_show(&ctx, &name, fmt);
            }
            ImageCommands::Import {
                file,
                parent,
                description,
                tag,
                repo,
                qemu_img,
                format,
            } => {
                let fmt = format::OutputFormat::from(format.as_str());
                let options = commands::image::ImportOptions {
                    repo,
                    parent,
                    description,
                    tag,
                };
                commands::image::handlers::handle_image_import(
                    &ctx, &file, options, &qemu_img, fmt,
                );
            }
            ImageCommands::Tag { tag, name } => {
                commands::image::handlers::handle_image_tag(&ctx, &tag, &name);
            }
            ImageCommands::Ancestors { name, format } => {
                let fmt = format::OutputFormat::from(format.as_str());
                commands::image::handlers::handle_image_ancestors(&ctx, &name, fmt);
            }
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
