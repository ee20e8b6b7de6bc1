use clap::Parser;
use keepvault::cli::commands;
use keepvault::cli::{data_dir, output, Cli, Commands};
use keepvault::config::Settings;

fn main() {
    let cli = Cli::parse();

    let settings = match data_dir(&cli).and_then(|dir| Settings::load(&dir)) {
        Ok(settings) => settings,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };
    keepvault::logging::init(&settings);

    let result = match cli.command {
        Commands::Register => commands::register::execute(&cli, &settings),
        Commands::List => commands::list::execute(&cli, &settings),
        Commands::Get { ref id } => commands::get::execute(&cli, &settings, id),
        Commands::Add {
            ref label,
            ref kind,
        } => commands::add::execute(&cli, &settings, kind, label.as_deref()),
        Commands::Delete { ref id, force } => {
            commands::delete::execute(&cli, &settings, id, force)
        }
        Commands::Reconcile => commands::reconcile::execute(&cli, &settings),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
