/*!
 * Command-line interface for FlatFS
 */

use std::io;
use std::process;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use flatfs::config::{Args, Config};
use flatfs::engine::Flattener;
use flatfs::report::{ReportFormat, Reporter};

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "flatfs", &mut io::stdout());
        return;
    }

    setup_logging(args.quiet, args.verbose);
    log::debug!("CLI args parsed: {:?}", args);

    let quiet = args.quiet;
    let config = Config::from_args(args);

    // Validate configuration before touching the filesystem
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) Elapsed: {elapsed_precise}")
        {
            Ok(style) => bar.set_style(style),
            Err(e) => log::warn!("Invalid progress template: {}", e),
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar
    };
    progress.set_prefix("Flattening");
    progress.set_message(format!("Scanning {}", config.source_dir.display()));

    let mut flattener = Flattener::new(config, Arc::new(progress.clone()));
    let result = flattener.run();
    progress.finish_and_clear();

    match result {
        Ok(summary) => {
            log::info!(
                "Flattened {} files into {}",
                summary.report.files_included,
                summary.output_dir.display()
            );
            if !quiet {
                Reporter::new(ReportFormat::ConsoleTable).print_report(&summary);
            }
        }
        Err(e) => {
            log::debug!("Run failed in phase {:?}", flattener.phase());
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}
