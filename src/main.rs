use clap::Parser;
use ttam_relatives::cli::{self, Commands};
use ttam_relatives::commands::{self, analyze::AnalyzeOptions, fetch::FetchOptions};
use ttam_relatives::config::Config;
use ttam_relatives::utils::init_tracing;

fn main() {
    init_tracing();
    let args = cli::Args::parse();
    let mut config = Config::load();

    let result = match args.command {
        Commands::Fetch {
            cookie,
            cookie_file,
            output_dir,
            delay_ms,
            limit,
            format,
        } => commands::fetch::run(
            &config,
            FetchOptions {
                cookie,
                cookie_file,
                output_dir,
                delay_ms,
                limit,
                format,
            },
        ),
        Commands::Stats { export_file } => commands::stats::run(&export_file),
        Commands::Analyze {
            export_file,
            country,
            label,
            output_dir,
            list_locations,
        } => commands::analyze::run(
            &mut config,
            AnalyzeOptions {
                export_file,
                country,
                label,
                output_dir,
                list_locations,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
