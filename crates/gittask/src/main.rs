mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("GITTASK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Init => commands::init::run(&cli),
        Command::Add { title, property } => commands::task::add(&cli, title, property),
        Command::List => commands::task::list(&cli),
        Command::Show { id } => commands::task::show(&cli, id),
        Command::Save { file } => commands::task::save(&cli, file.as_deref()),
        Command::Delete { id } => commands::task::delete(&cli, id),
        Command::Commit { message } => commands::commit::run(&cli, message.as_deref()),
        Command::Sort { commit } => commands::sort::run(&cli, *commit),
        Command::Import { cmd } => commands::import::run(&cli, cmd.clone()),
    };

    if let Err(e) = result {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}
