use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashdoc::cli::commands::{
    check, config, document::DocumentOptions, publish::PublishOptions,
    scorecard::ScorecardOptions,
};
use dashdoc::cli::ui::Output;
use dashdoc::config::UpdateMode;
use dashdoc::types::DocError;

#[derive(Parser)]
#[command(name = "dashdoc")]
#[command(
    version,
    about = "Turns dashboard screenshots into published user guides"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the layered configuration
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze screenshots and generate a user guide
    Document {
        #[arg(help = "Screenshot paths")]
        images: Vec<String>,
        #[arg(long, help = "Take the most recent screenshots from this directory")]
        dir: Option<PathBuf>,
        #[arg(long, default_value = "3", help = "Screenshots to take from --dir")]
        recent: usize,
        #[arg(long, short, help = "Dashboard title")]
        title: Option<String>,
        #[arg(long, help = "Publish the guide to Confluence")]
        publish: bool,
        #[arg(long = "dry-run", help = "Publish into an in-memory store")]
        dry_run: bool,
        #[arg(long, help = "Parent page title")]
        parent: Option<String>,
        #[arg(long, help = "Attach screenshots to the published page")]
        attach_images: bool,
    },

    /// Score a saved guide against the quality rubric
    Validate {
        #[arg(help = "Guide HTML file")]
        file: PathBuf,
        #[arg(long, help = "Write the markdown report here")]
        report: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json, markdown"
        )]
        format: String,
    },

    /// Publish a saved guide to Confluence
    Publish {
        #[arg(help = "Guide HTML file")]
        file: PathBuf,
        #[arg(long, short, help = "Page title")]
        title: String,
        #[arg(long, help = "Parent page title")]
        parent: Option<String>,
        #[arg(long = "image", help = "Screenshot to attach (repeatable)")]
        images: Vec<String>,
        #[arg(long, help = "replace or always-create-new")]
        update_mode: Option<UpdateMode>,
        #[arg(long = "dry-run", help = "Publish into an in-memory store")]
        dry_run: bool,
    },

    /// Analyze scorecard metrics directly
    Scorecard {
        #[arg(long, short, help = "CSV or JSON export (queries Redshift when omitted)")]
        input: Option<PathBuf>,
        #[arg(long, help = "Rule-based recommendations only")]
        no_llm: bool,
        #[arg(long, help = "Print the full report as JSON")]
        json: bool,
    },

    /// Check credentials and connectivity
    Check,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdashdoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let out = Output::new();
            out.error(&e.to_string());
            if let Some(hint) = e.downcast_ref::<DocError>().and_then(DocError::hint) {
                out.info(hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config;

    match cli.command {
        Commands::Document {
            images,
            dir,
            recent,
            title,
            publish,
            dry_run,
            parent,
            attach_images,
        } => {
            dashdoc::cli::commands::document::run(
                config_path,
                DocumentOptions {
                    images,
                    dir,
                    recent,
                    title,
                    publish,
                    dry_run,
                    parent,
                    attach_images,
                },
            )?;
        }
        Commands::Validate {
            file,
            report,
            format,
        } => {
            dashdoc::cli::commands::validate::run(&file, report, &format)?;
        }
        Commands::Publish {
            file,
            title,
            parent,
            images,
            update_mode,
            dry_run,
        } => {
            dashdoc::cli::commands::publish::run(
                config_path,
                PublishOptions {
                    file,
                    title,
                    parent,
                    images,
                    update_mode,
                    dry_run,
                },
            )?;
        }
        Commands::Scorecard {
            input,
            no_llm,
            json,
        } => {
            dashdoc::cli::commands::scorecard::run(
                config_path,
                ScorecardOptions {
                    input,
                    no_llm,
                    json,
                },
            )?;
        }
        Commands::Check => {
            check::run(config_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                config::show(config_path, &format)?;
            }
            ConfigAction::Path => {
                config::path()?;
            }
            ConfigAction::Init { global, force } => {
                config::init(global, force)?;
            }
        },
    }

    Ok(())
}
