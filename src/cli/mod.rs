//! CLI entry point — module declarations and the `run()` dispatcher

mod args;
mod convert;
mod show;

use args::{Args, Command};
use clap::Parser;
use colored::Colorize;

/// Main CLI entry point — parse args and dispatch to the appropriate handler
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    // stdout carries converted documents, so logs go to stderr
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    match args.command {
        Command::Commands => {
            show::list_commands();
            Ok(())
        }
        Command::Config { format } => {
            let cwd = std::env::current_dir().ok();
            let config = convert::load_config(args.config.as_deref(), cwd.as_deref())?;
            print!("{}", show::render_config(&config, format)?);
            Ok(())
        }
        Command::Convert { to, ref file, ref output } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let outcome = runtime.block_on(convert::run_convert(
                &args,
                to.into(),
                file,
                output.as_deref(),
            ));
            if let Err(e) = outcome {
                eprintln!("{} {:#}", "error:".red().bold(), e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
