use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser, Subcommand};

/// Standard input/output filename
pub const STDIO_FILE: &str = "-";

const DECODE_USAGE: &str = r#"
This command accepts raw PCM samples in signed 16-bit (i16) format, at the given sampling --rate, and decodes any SAME headers that are present. Consolidated headers are printed in their ASCII representation, one per line, with their confidence score on standard error.

You can pipe in an audio file with sox

    sox input.wav -t raw -r 22.05k -e signed -b 16 -c 1 - \
        | samecast decode -r 22050

ALWAYS TEST YOUR DECODING SETUP!
"#;

const ENCODE_USAGE: &str = r#"
This command builds a complete SAME transmission--three header bursts, attention tone, message slot, and three end-of-message bursts--and writes it as raw PCM samples in signed 16-bit (i16) format at the given sampling --rate.

You can turn the output into a playable file with sox

    samecast encode --originator WXR --event RWT \
        --location 039173 --duration 15 --callsign KEAS \
        | sox -t raw -r 22.05k -e signed -b 16 -c 1 - out.wav

Transmitting SAME messages over the air requires authorization. Keep test audio away from anything that can hear it.
"#;

const ADVANCED: &str = "Advanced Modem Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, global = true, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded headers
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Decode SAME headers from raw PCM audio
    #[command(after_help = DECODE_USAGE)]
    Decode(DecodeArgs),

    /// Encode a SAME header into raw PCM audio
    #[command(after_help = ENCODE_USAGE)]
    Encode(EncodeArgs),
}

/// Arguments for decoding
#[derive(clap::Args, Clone, Debug)]
pub struct DecodeArgs {
    /// Sampling rate (Hz)
    ///
    /// Set to the sampling rate of your audio source. If sampling
    /// from a sound card, use the card's native rate—usually 44100
    /// or 48000. Avoid resampling the audio.
    #[arg(short, long, default_value_t = 22050)]
    pub rate: u32,

    /// Input file (or "-" for stdin)
    ///
    /// The input must be one-channel (mono), signed 16-bit
    /// native-endian at --rate.
    #[arg(long, default_value_t = STDIO_FILE.to_string())]
    pub file: String,

    /// Suppress alerts scoring below this confidence (0.0 – 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub min_confidence: f32,

    /// DC-blocker filter length (input samples; 0 = one symbol)
    #[arg(long, default_value_t = 0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub dc_blocker_len: usize,

    /// AGC bandwidth (fsym)
    #[arg(long, default_value_t = 0.25)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub agc_bw: f32,

    /// Symbol timing loop bandwidth, searching (fsym)
    #[arg(long, default_value_t = 0.125)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_bw_unlocked: f32,

    /// Symbol timing loop bandwidth, tracking (fsym)
    #[arg(long, default_value_t = 0.05)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_bw_locked: f32,

    /// Symbol timing maximum deviation (fsym)
    #[arg(long, default_value_t = 0.01)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timing_max_dev: f32,

    /// Permitted bit errors in the preamble sync pattern (<7)
    #[arg(long, default_value_t = 2)]
    #[arg(value_parser = value_parser!(u32).range(0..6))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub preamble_max_errors: u32,
}

impl DecodeArgs {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIO_FILE
    }
}

/// Arguments for encoding
#[derive(clap::Args, Clone, Debug)]
pub struct EncodeArgs {
    /// Originator code: PEP, CIV, WXR, or EAS
    #[arg(short, long)]
    pub originator: String,

    /// Three-character event code, e.g. RWT or TOR
    #[arg(short, long)]
    pub event: String,

    /// Six-digit location code (repeat for up to 31 areas)
    #[arg(short, long = "location", required = true)]
    pub locations: Vec<String>,

    /// Message validity duration, in minutes
    #[arg(short, long)]
    pub duration: u32,

    /// Issue time as JJJHHMM (Julian day + UTC time)
    ///
    /// Defaults to the current UTC time.
    #[arg(short, long)]
    pub issue: Option<String>,

    /// Station callsign, up to 8 characters ("/" for "-")
    #[arg(short, long)]
    pub callsign: String,

    /// Attention tone duration, seconds (8 – 25)
    #[arg(short, long, default_value_t = 8.0)]
    pub attention: f32,

    /// Sampling rate (Hz)
    #[arg(short, long, default_value_t = 22050)]
    pub rate: u32,

    /// Output file (or "-" for stdout)
    ///
    /// The output is one-channel (mono), signed 16-bit
    /// native-endian at --rate.
    #[arg(long, default_value_t = STDIO_FILE.to_string())]
    pub file: String,
}

impl EncodeArgs {
    /// Return true if the user requests output to stdout
    pub fn output_is_stdout(&self) -> bool {
        self.file == STDIO_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_encode() {
        let args = Args::try_parse_from([
            "samecast", "encode", "-o", "WXR", "-e", "TOR", "-l", "039173", "-l", "039051", "-d",
            "45", "-c", "KEAS",
        ])
        .expect("parse");

        match args.command {
            Command::Encode(enc) => {
                assert_eq!("WXR", enc.originator);
                assert_eq!(vec!["039173".to_owned(), "039051".to_owned()], enc.locations);
                assert_eq!(45, enc.duration);
                assert!(enc.issue.is_none());
                assert!(enc.output_is_stdout());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_decode() {
        let args =
            Args::try_parse_from(["samecast", "decode", "-r", "44100", "--min-confidence", "0.8"])
                .expect("parse");

        match args.command {
            Command::Decode(dec) => {
                assert_eq!(44100, dec.rate);
                assert!(dec.input_is_stdin());
                assert_eq!(0.8, dec.min_confidence);
            }
            _ => unreachable!(),
        }
    }
}
