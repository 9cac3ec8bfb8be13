use clap::builder::styling::{AnsiColor, Styles};
use clap::{ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "phprefactor")]
#[command(about = "Run Rector, PHP-CS-Fixer and PHPStan against a PHP project")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (defaults to the nearest directory with composer.json)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enabled tools on a file or directory
    Run {
        /// File or directory (defaults to the project root)
        target: Option<PathBuf>,

        /// Preview changes without writing files (tools without a preview mode are skipped)
        #[arg(long)]
        dry_run: bool,

        /// Only run these tools, by key (repeatable)
        #[arg(short, long = "tool", value_name = "KEY")]
        tools: Vec<String>,
    },

    /// Run the enabled tools on a saved file if runOnSave is set
    OnSave {
        /// Saved file
        file: PathBuf,
    },

    /// Check that tools are installed and print their versions
    Check {
        /// Only check these tools, by key (repeatable)
        #[arg(short, long = "tool", value_name = "KEY")]
        tools: Vec<String>,
    },

    /// Install a tool globally with composer
    Install {
        /// Tool key (rector, phpcsfixer, phpstan)
        key: String,
    },

    /// Write a tool's config file from settings (existing files are kept)
    GenerateConfig {
        /// Tool key (rector, phpcsfixer, phpstan)
        key: String,
    },

    /// List tools in run order
    List,
}

/// Help output styling.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::Cyan.on_default().bold())
    .placeholder(AnsiColor::Cyan.on_default());

fn help_color_choice() -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Reset SIGPIPE to default behavior so piping to `head` etc. doesn't panic.
#[cfg(unix)]
fn reset_sigpipe() {
    // SAFETY: only changes the signal disposition back to the POSIX default.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

#[tokio::main]
async fn main() {
    reset_sigpipe();

    let matches = Cli::command()
        .styles(HELP_STYLES)
        .color(help_color_choice())
        .get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    logging::init(cli.verbose);
    let format = OutputFormat::from_cli(cli.json);
    let root = cli.root.as_deref();

    let exit_code = match cli.command {
        Commands::Run {
            target,
            dry_run,
            tools,
        } => commands::run::cmd_run(root, target, dry_run, &tools, format).await,
        Commands::OnSave { file } => commands::run::cmd_on_save(root, file, format).await,
        Commands::Check { tools } => commands::check::cmd_check(root, &tools, format).await,
        Commands::Install { key } => commands::check::cmd_install(root, &key, format).await,
        Commands::GenerateConfig { key } => {
            commands::check::cmd_generate_config(root, &key, format)
        }
        Commands::List => commands::list::cmd_list(root, format),
    };

    std::process::exit(exit_code);
}
