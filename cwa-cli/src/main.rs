use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use cwa_lib::checksum::{self, Checksum};
use cwa_lib::{CwaError, Packet};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod fixture;

/// Offline tools for CWA scanner upload packets.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a packet, verify its checksum and print it.
    Decode {
        /// Packet file, or "-" for stdin.
        file: PathBuf,
        /// Input is hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
        /// Print JSON instead of the text dump.
        #[arg(long)]
        json: bool,
    },
    /// Print the digest the server acknowledges with and whether it matches.
    Checksum {
        /// Packet file, or "-" for stdin.
        file: PathBuf,
        /// Input is hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
    },
    /// Build a packet from a JSON description.
    Encode {
        /// JSON description, or "-" for stdin.
        input: PathBuf,
        /// Where to write the packet.
        #[arg(short, long)]
        output: PathBuf,
        /// Write hex text instead of raw bytes.
        #[arg(long)]
        hex: bool,
    },
}

#[derive(Serialize)]
struct DecodeReport<'a> {
    packet: &'a Packet,
    computed_checksum: Checksum,
    verified: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.verbose.tracing_level_filter().into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Command::Decode { file, hex, json } => decode(&read_packet(&file, hex)?, json),
        Command::Checksum { file, hex } => check(&read_packet(&file, hex)?),
        Command::Encode { input, output, hex } => encode(&input, &output, hex),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Failed to read {:?}", path))
    }
}

fn read_packet(path: &Path, is_hex: bool) -> Result<Vec<u8>> {
    let raw = read_input(path)?;
    let bytes = if is_hex { parse_hex(&raw)? } else { raw };
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(bytes)
}

/// Hex text with any whitespace stripped.
fn parse_hex(text: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    hex::decode(digits).context("Input is not valid hex")
}

fn decode(bytes: &[u8], json: bool) -> Result<()> {
    let packet = Packet::decode(bytes)
        .with_context(|| format!("Failed to decode {} bytes", bytes.len()))?;
    let computed = checksum::acknowledgment(bytes)?;
    let verified = computed == packet.checksum;

    let mut out = io::stdout().lock();
    if json {
        let report = DecodeReport {
            packet: &packet,
            computed_checksum: computed,
            verified,
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Payload Length: {}", bytes.len())?;
        writeln!(out, "{}", packet)?;
        writeln!(out, "Calculated Checksum: {}", computed)?;
    }

    if !verified {
        bail!(CwaError::ChecksumMismatch {
            computed,
            received: packet.checksum
        });
    }
    Ok(())
}

fn check(bytes: &[u8]) -> Result<()> {
    let (_, received) = checksum::split(bytes)?;
    let computed = checksum::acknowledgment(bytes)?;
    println!("Received:   {}", received);
    println!("Calculated: {}", computed);
    checksum::verify(bytes)?;
    println!("OK");
    Ok(())
}

fn encode(input: &Path, output: &Path, as_hex: bool) -> Result<()> {
    let spec: fixture::PacketSpec = serde_json::from_slice(&read_input(input)?)
        .with_context(|| format!("Invalid packet description in {:?}", input))?;
    let packet = spec.into_packet()?;
    let bytes = packet.encode()?;

    let written = if as_hex {
        fs::write(output, hex::encode_upper(&bytes) + "\n")
    } else {
        fs::write(output, &bytes)
    };
    written.with_context(|| format!("Failed to write {:?}", output))?;

    eprintln!(
        "Wrote {} bytes ({} frames, {} observations), checksum {}",
        bytes.len(),
        packet.frames.len(),
        packet.observation_count(),
        packet.checksum
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_ignores_whitespace() {
        assert_eq!(parse_hex(b"43 57\n41\t01").unwrap(), vec![0x43, 0x57, 0x41, 0x01]);
        assert!(parse_hex(b"4G").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["cwa", "decode", "--hex", "--json", "packet.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Decode { hex: true, json: true, .. }));

        let cli = Cli::try_parse_from(["cwa", "encode", "spec.json", "-o", "out.bin"]).unwrap();
        assert!(matches!(cli.command, Command::Encode { hex: false, .. }));

        assert!(Cli::try_parse_from(["cwa", "encode", "spec.json"]).is_err());
    }

    #[test]
    fn test_decode_rejects_corrupted_packet() {
        let packet = Packet::new(1, 1, Vec::new()).unwrap();
        let mut bytes = packet.encode().unwrap().to_vec();
        bytes[4] ^= 0x01;
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CwaError>(),
            Some(CwaError::ChecksumMismatch { .. })
        ));
    }
}
