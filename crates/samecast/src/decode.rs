//! The `decode` subcommand

use std::io;

use anyhow::{anyhow, Context};
use byteorder::{NativeEndian, ReadBytesExt};
use log::info;

use samewave::{DecodeEvent, SameReceiverBuilder};

use crate::cli::{Args, DecodeArgs};

/// Run the decoder against stdin or a file
pub fn run(args: &Args, dec: &DecodeArgs) -> Result<(), anyhow::Error> {
    let mut rx = SameReceiverBuilder::new(dec.rate)
        .with_agc_gain_limits(1.0f32 / (i16::MAX as f32), 1.0e6)
        .with_agc_bandwidth(dec.agc_bw)
        .with_dc_blocker_length(dec.dc_blocker_len)
        .with_timing_bandwidth(dec.timing_bw_unlocked, dec.timing_bw_locked)
        .with_timing_max_deviation(dec.timing_max_dev)
        .with_sync_max_errors(dec.preamble_max_errors)
        .build();

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let mut inbuf = file_setup(dec, stdin_handle)?;

    let samples = std::iter::from_fn(|| Some(inbuf.read_i16::<NativeEndian>().ok()? as f32));
    for evt in rx.iter(samples) {
        report(args, dec, &evt);
    }

    // straggling groups from a close-cut recording
    for alert in rx.flush() {
        report(args, dec, &DecodeEvent::Alert(alert));
    }

    Ok(())
}

// Print one receiver event
fn report(args: &Args, dec: &DecodeArgs, evt: &DecodeEvent) {
    match evt {
        DecodeEvent::Alert(alert) => {
            info!("{}", alert);
            if let Some(Ok(issued)) = alert
                .header()
                .issue_time()
                .map(|t| t.to_datetime(&chrono::Utc::now()))
            {
                info!(
                    "{}, issued {}",
                    alert.header().event(),
                    issued.format("%Y-%m-%d %H:%M UTC")
                );
            }
            if !args.quiet && alert.confidence() >= dec.min_confidence {
                println!("{}", alert.raw());
            }
        }
        DecodeEvent::EndOfMessage { confidence } => {
            info!("end of message (confidence {:.2})", confidence);
            if !args.quiet {
                println!("NNNN");
            }
        }
        other => info!("receiver: {:?}", other),
    }
}

fn file_setup<'stdin>(
    dec: &DecodeArgs,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if dec.input_is_stdin() {
        info!("SAME decoder reading standard input");
        if !crate::is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read audio samples from a terminal.

Pipe a source of raw uncompressed audio from sox, parec, rtl_fm,
or similar into this program."
            ))
        }
    } else {
        info!("SAME decoder reading file: \"{}\"", &dec.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&dec.file)
                .with_context(|| format!("Unable to open --file \"{}\"", dec.file))?,
        )))
    }
}
