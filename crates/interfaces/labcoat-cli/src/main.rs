use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use labcoat_cli::accounts::{self, AccountManager};
use labcoat_app_core::ActionKind;
use labcoat_cli::commands;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored server account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Inspect and act on a single build
    Build {
        #[command(subcommand)]
        command: BuildCommands,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    Set {
        #[arg(long, env = "LABCOAT_SERVER")]
        server: String,
        #[arg(long, env = "LABCOAT_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        username: Option<String>,
    },
    Show,
}

#[derive(clap::Args)]
struct BuildTarget {
    #[arg(long)]
    project: u64,
    #[arg(long)]
    build: u64,
}

#[derive(Subcommand)]
enum BuildCommands {
    Show {
        #[command(flatten)]
        target: BuildTarget,
    },
    Retry {
        #[command(flatten)]
        target: BuildTarget,
    },
    Erase {
        #[command(flatten)]
        target: BuildTarget,
    },
    Cancel {
        #[command(flatten)]
        target: BuildTarget,
    },
    Download {
        #[command(flatten)]
        target: BuildTarget,
        #[arg(short, long, help = "Directory to save the archive in")]
        output: Option<Utf8PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    let mgr = AccountManager::new();

    match cli.command {
        Commands::Account { command } => match command {
            AccountCommands::Set {
                server,
                token,
                username,
            } => accounts::handle_set(&mgr, server, token, username)?,
            AccountCommands::Show => accounts::handle_show(&mgr)?,
        },
        Commands::Build { command } => {
            let account = mgr.current()?;
            let (target, kind) = match command {
                BuildCommands::Show { target } => {
                    commands::cmd_build_show(&account, target.project, target.build).await?;
                    return Ok(());
                }
                BuildCommands::Download { target, output } => {
                    commands::cmd_build_download(&account, target.project, target.build, output)
                        .await?;
                    return Ok(());
                }
                BuildCommands::Retry { target } => (target, ActionKind::Retry),
                BuildCommands::Erase { target } => (target, ActionKind::Erase),
                BuildCommands::Cancel { target } => (target, ActionKind::Cancel),
            };
            commands::cmd_build_action(&account, kind, target.project, target.build)
                .await?;
        }
    }

    Ok(())
}
