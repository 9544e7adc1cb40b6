use clap::Parser;
use log::LevelFilter;

mod cli;
mod decode;
mod encode;

use cli::{Args, CliError, Command};

fn main() {
    match samecast() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn samecast() -> Result<(), CliError> {
    let args = Args::try_parse()?;
    log_setup(&args);

    match &args.command {
        Command::Decode(dec) => decode::run(&args, dec)?,
        Command::Encode(enc) => encode::run(&args, enc)?,
    }

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("samewave", log_filter)
            .filter_module("samecast", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
