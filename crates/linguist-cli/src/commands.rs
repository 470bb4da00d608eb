use std::sync::Arc;

use colored::Colorize;
use tokio::io::BufReader;

use linguist_background::{Background, Collaborators};
use linguist_config::migrate_all;
use linguist_store::FileBackend;

use crate::channel;
use crate::cli::{Cli, Command, MigrateArgs, ServeArgs};
use crate::host::{LoggingContextMenu, LoggingTheme};
use crate::scheduler::CommandScheduler;
use crate::settings::HostSettings;

/// Dispatch a parsed command line.
pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Migrate(args) => cmd_migrate(args).await,
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let settings = HostSettings::load(args.config.as_deref())?;
    let data_dir = settings.data_dir(args.data_dir);
    let program = settings.translator_command(args.translator_cmd.as_deref());
    if program.is_empty() {
        eprintln!(
            "{} no translator command configured; translate requests will fail",
            "!".yellow().bold()
        );
    }

    let backend = FileBackend::open(&data_dir).await?;
    let scheduler = Arc::new(CommandScheduler::new(program, settings.translate_timeout()));
    let mut collaborators = Collaborators::new(scheduler)
        .with_theme(Arc::new(LoggingTheme))
        .with_context_menus(
            Arc::new(LoggingContextMenu::new("selection")),
            Arc::new(LoggingContextMenu::new("page")),
        );
    if let Some(builtins) = settings.builtin_translators.clone() {
        collaborators = collaborators.with_builtin_translators(builtins);
    }

    let background = Arc::new(Background::new(Arc::new(backend), collaborators));
    background.start().await?;
    if let Some(report) = background.migration_report() {
        eprintln!(
            "{} Background ready (schema v{}, {} migration(s) applied)",
            "✓".green().bold(),
            report.to_version,
            report.applied_count()
        );
    }
    eprintln!("  Data: {}", data_dir.display().to_string().dimmed());

    channel::serve(background, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

async fn cmd_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let settings = HostSettings::load(args.config.as_deref())?;
    let data_dir = settings.data_dir(args.data_dir);
    let backend = FileBackend::open(&data_dir).await?;

    let report = migrate_all(&backend).await?;
    if report.applied.is_empty() {
        println!(
            "{} Already at schema version {}",
            "✓".green().bold(),
            report.to_version
        );
    } else {
        println!(
            "{} Applied {} migration(s), schema version {} -> {}",
            "✓".green().bold(),
            report.applied_count(),
            report.from_version,
            report.to_version
        );
        for name in &report.applied {
            println!("  {}", name);
        }
    }
    Ok(())
}
