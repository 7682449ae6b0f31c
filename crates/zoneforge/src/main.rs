//! Zone-file checker and wire-format dumper.
//!
//! Parses each zone file, reports `file:line:column` on the first error,
//! and prints a per-file summary. With `--wire` every record is also
//! written out as a raw wire-format resource record.

use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info};
use zf_zone::{class_code, Options, Parser, Record, Sink};

#[derive(clap::Parser)]
#[command(name = "zoneforge", version, about = "Parse DNS zone files into wire-format records")]
struct Args {
    /// Zone files to parse.
    #[arg(required = true)]
    zones: Vec<PathBuf>,

    /// Origin appended to relative names (absolute, e.g. `example.com.`).
    #[arg(long)]
    origin: Option<String>,

    /// Default TTL for records that omit one, when no $TTL has appeared.
    #[arg(long)]
    ttl: Option<u32>,

    /// Default record class: IN, CS, CH, HS or CLASSnn.
    #[arg(long)]
    class: Option<String>,

    /// JSON file holding parser options; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refuse $INCLUDE directives.
    #[arg(long)]
    no_includes: bool,

    /// Refuse TYPEnn/CLASSnn mnemonics and the generic \# RDATA form.
    #[arg(long)]
    no_unknown: bool,

    /// Refuse 1h30m-style TTL durations.
    #[arg(long)]
    no_pretty_ttl: bool,

    /// Input window size in bytes (rounded up to a multiple of 64).
    #[arg(long)]
    window: Option<usize>,

    /// Write all parsed records in raw wire format to this file.
    #[arg(long)]
    wire: Option<PathBuf>,
}

struct Tally<'w> {
    records: u64,
    rdata_bytes: u64,
    writer: Option<&'w mut BufWriter<std::fs::File>>,
    write_error: Option<std::io::Error>,
}

impl Sink for Tally<'_> {
    fn record(&mut self, record: &Record<'_>) -> ControlFlow<()> {
        self.records += 1;
        self.rdata_bytes += record.rdata.len() as u64;
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = write_wire(writer, record) {
                self.write_error = Some(e);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// owner, type, class, TTL, RDLENGTH, RDATA — the on-the-wire record shape.
fn write_wire(out: &mut impl Write, record: &Record<'_>) -> std::io::Result<()> {
    out.write_all(record.owner)?;
    out.write_all(&record.rtype.to_be_bytes())?;
    out.write_all(&record.class.to_be_bytes())?;
    out.write_all(&record.ttl.to_be_bytes())?;
    out.write_all(&(record.rdata.len() as u16).to_be_bytes())?;
    out.write_all(record.rdata)
}

fn load_options(args: &Args) -> anyhow::Result<Options> {
    let mut options = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        }
        None => Options::default(),
    };
    if let Some(origin) = &args.origin {
        options.origin = Some(origin.clone());
    }
    if let Some(ttl) = args.ttl {
        options.default_ttl = Some(ttl);
    }
    if let Some(class) = &args.class {
        options.default_class = class_code(class)
            .ok_or_else(|| anyhow::anyhow!("unknown class {class}"))?;
    }
    if let Some(window) = args.window {
        options.window_size = window;
    }
    if args.no_includes {
        options.allow_includes = false;
    }
    if args.no_unknown {
        options.accept_unknown_rrtype = false;
    }
    if args.no_pretty_ttl {
        options.pretty_ttl = false;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().expect("static filter")),
        )
        .init();

    let args = <Args as clap::Parser>::parse();
    let options = load_options(&args)?;
    let mut parser = Parser::new(options)?;

    let mut wire = match &args.wire {
        Some(path) => Some(BufWriter::new(std::fs::File::create(path)?)),
        None => None,
    };

    for zone in &args.zones {
        let started = Instant::now();
        let size = std::fs::metadata(zone).map(|m| m.len()).unwrap_or(0);
        let mut tally = Tally {
            records: 0,
            rdata_bytes: 0,
            writer: wire.as_mut(),
            write_error: None,
        };
        match parser.parse_file(zone, &mut tally) {
            Ok(_) => {}
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
        if let Some(e) = tally.write_error {
            return Err(anyhow::Error::new(e).context("writing wire output"));
        }
        let elapsed = started.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            size as f64 / elapsed.as_secs_f64() / (1024.0 * 1024.0)
        } else {
            0.0
        };
        info!(
            "{}: {} records, {} rdata bytes, {:.1?} ({:.1} MiB/s)",
            zone.display(),
            tally.records,
            tally.rdata_bytes,
            elapsed,
            throughput,
        );
    }

    if let Some(mut writer) = wire {
        writer.flush()?;
    }
    Ok(())
}
