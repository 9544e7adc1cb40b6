//! The `encode` subcommand

use std::io::{self, Write};

use anyhow::{anyhow, Context};
use byteorder::{NativeEndian, WriteBytesExt};
use log::info;

use samewave::{EncodeOptions, IssueTime, Originator, SameEncoder, SameHeader, ValidDuration};

use crate::cli::{Args, EncodeArgs};

/// Assemble a transmission and write it to stdout or a file
pub fn run(_args: &Args, enc: &EncodeArgs) -> Result<(), anyhow::Error> {
    let header = build_header(enc)?;
    info!("encoding \"{}\"", header);

    let options = EncodeOptions {
        sample_rate: enc.rate,
        attention_secs: enc.attention,
        ..EncodeOptions::default()
    };
    let message = SameEncoder::new(options)
        .encode(&header, None)
        .context("unable to encode message")?;
    info!(
        "transmission is {:.1} s at {} Hz",
        message.duration_secs(),
        enc.rate
    );

    let stdout = io::stdout();
    let stdout_handle = stdout.lock();
    let mut outbuf = file_setup(enc, stdout_handle)?;
    for sample in message.to_i16_samples() {
        outbuf.write_i16::<NativeEndian>(sample)?;
    }
    outbuf.flush()?;

    Ok(())
}

// Build and pre-validate the header from the command line
fn build_header(enc: &EncodeArgs) -> Result<SameHeader, anyhow::Error> {
    let originator = Originator::from(enc.originator.as_str());

    let issue = match &enc.issue {
        Some(wire) => Some(parse_issue(wire)?),
        None => None,
    };

    let header = SameHeader::new(
        originator,
        &enc.event,
        &enc.locations,
        ValidDuration::from_minutes(enc.duration)
            .map_err(|e| anyhow!("--duration: {}", e))?,
        issue,
        &enc.callsign,
    )?;
    header.validate()?;
    Ok(header)
}

// Parse a JJJHHMM issue time argument
fn parse_issue(wire: &str) -> Result<IssueTime, anyhow::Error> {
    if wire.len() != 7 || !wire.bytes().all(|b| b.is_ascii_digit()) {
        return Err(anyhow!(
            "--issue must be seven digits (JJJHHMM), not \"{}\"",
            wire
        ));
    }
    Ok(IssueTime::new(
        wire[0..3].parse()?,
        wire[3..5].parse()?,
        wire[5..7].parse()?,
    )?)
}

fn file_setup<'stdout>(
    enc: &EncodeArgs,
    stdout: std::io::StdoutLock<'stdout>,
) -> Result<Box<dyn io::Write + 'stdout>, anyhow::Error> {
    if enc.output_is_stdout() {
        info!("SAME encoder writing standard output");
        if !crate::is_terminal(&std::io::stdout()) {
            Ok(Box::new(io::BufWriter::new(stdout)))
        } else {
            Err(anyhow!(
                "cowardly refusing to write audio samples to a terminal.

Pipe the output into sox, pacat, or a file."
            ))
        }
    } else {
        info!("SAME encoder writing file: \"{}\"", &enc.file);
        Ok(Box::new(io::BufWriter::new(
            std::fs::File::create(&enc.file)
                .with_context(|| format!("Unable to create --file \"{}\"", enc.file))?,
        )))
    }
}
