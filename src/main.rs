//! # Flight Record
//!
//! Decode a drone flight-controller log and export it as a flight track CSV,
//! JSON Lines, or a short text summary.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use flight_record::config::{Config, ExportFormat, LoggingConfig};
use flight_record::export::{
    write_csv, write_jsonl, write_summary, ElevationSource, FixedElevation, NoElevation,
};
use flight_record::{decode, decode_strict, FrameSequence};

/// Decode a drone flight-controller log into typed telemetry records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Flight log to decode
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Opaque header bytes to skip before the first frame
    #[arg(long)]
    header_size: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Output file; defaults next to the input, or stdout for the summary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ground elevation at take-off, in meters
    #[arg(long)]
    base_altitude: Option<f64>,

    /// Fail when the scan stops before the end of the log
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = init_logging(&config.logging)?;

    info!("Flight Record v{} starting...", env!("CARGO_PKG_VERSION"));

    let data = fs::read(&cli.input)
        .with_context(|| format!("Failed to read flight log {:?}", cli.input))?;

    let header_size = config.decoder.header_size;
    let frames = if config.decoder.strict {
        decode_strict(&data, header_size)
    } else {
        decode(&data, header_size)
    }
    .with_context(|| format!("Failed to decode {:?}", cli.input))?;

    info!(
        frames = frames.len(),
        consumed = frames.consumed(),
        remaining = frames.remaining(),
        "Decoded flight log"
    );

    let format = config.export.format;
    match output_path(&cli.input, format, cli.output.as_deref())? {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            export(&frames, &config, file)?;
            info!("Wrote {:?}", path);
        }
        None => export(&frames, &config, io::stdout().lock())?,
    }

    Ok(())
}

/// Load the configuration file, if any, and apply command line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => Config::default(),
    };

    if let Some(header_size) = cli.header_size {
        config.decoder.header_size = header_size;
    }
    if cli.strict {
        config.decoder.strict = true;
    }
    if let Some(format) = cli.format {
        config.export.format = format;
    }
    if let Some(base) = cli.base_altitude {
        config.export.base_altitude_m = Some(base);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Log to stderr, or to a file when one is configured
///
/// The returned guard must be held until exit so buffered file output is flushed.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: LevelFilter = logging
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", logging.level))?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if logging.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(None);
    }

    let log_file = File::create(&logging.file)
        .with_context(|| format!("Failed to create log file at {:?}", logging.file))?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

/// Where the export goes; `None` means stdout
///
/// Default files keep the full input name and add an extension, so
/// `flight.dat` exports to `flight.dat.csv`.
///
/// # Errors
///
/// Returns error if the export would overwrite the input log.
fn output_path(input: &Path, format: ExportFormat, output: Option<&Path>) -> Result<Option<PathBuf>> {
    let path = match (output, format) {
        (Some(path), _) => path.to_path_buf(),
        (None, ExportFormat::Csv) => append_extension(input, "csv"),
        (None, ExportFormat::Jsonl) => append_extension(input, "jsonl"),
        (None, ExportFormat::Summary) => return Ok(None),
    };

    if same_file(&path, input) {
        bail!("Refusing to overwrite the input log {:?}", input);
    }
    Ok(Some(path))
}

fn append_extension(input: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn export<W: io::Write>(frames: &FrameSequence, config: &Config, writer: W) -> Result<()> {
    match config.export.format {
        ExportFormat::Csv => {
            let elevation: Box<dyn ElevationSource> = match config.export.base_altitude_m {
                Some(base) => Box::new(FixedElevation(base)),
                None => Box::new(NoElevation),
            };
            let rows = write_csv(
                frames,
                elevation.as_ref(),
                &config.export.timestamp_format,
                writer,
            )?;
            info!(rows, "Exported flight track");
        }
        ExportFormat::Jsonl => {
            let lines = write_jsonl(frames, writer)?;
            info!(lines, "Exported frames as JSON Lines");
        }
        ExportFormat::Summary => write_summary(frames, writer)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "flight-record",
            "flight.dat",
            "--header-size",
            "12",
            "--format",
            "jsonl",
            "--base-altitude",
            "42.5",
            "--strict",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.decoder.header_size, 12);
        assert!(config.decoder.strict);
        assert_eq!(config.export.format, ExportFormat::Jsonl);
        assert_eq!(config.export.base_altitude_m, Some(42.5));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["flight-record", "flight.dat"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_cli_rejects_oversized_header() {
        let cli = Cli::parse_from(["flight-record", "flight.dat", "--header-size", "1000000"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_output_path_defaults() {
        let input = Path::new("logs/flight.dat");
        assert_eq!(
            output_path(input, ExportFormat::Csv, None).unwrap(),
            Some(PathBuf::from("logs/flight.dat.csv"))
        );
        assert_eq!(
            output_path(input, ExportFormat::Jsonl, None).unwrap(),
            Some(PathBuf::from("logs/flight.dat.jsonl"))
        );
        assert_eq!(output_path(input, ExportFormat::Summary, None).unwrap(), None);
    }

    #[test]
    fn test_output_path_never_replaces_input_extension() {
        assert_eq!(
            output_path(Path::new("log.csv"), ExportFormat::Csv, None).unwrap(),
            Some(PathBuf::from("log.csv.csv"))
        );
        assert_eq!(
            output_path(Path::new("log.jsonl"), ExportFormat::Jsonl, None).unwrap(),
            Some(PathBuf::from("log.jsonl.jsonl"))
        );
    }

    #[test]
    fn test_output_path_explicit() {
        let input = Path::new("flight.dat");
        let out = Path::new("track.csv");
        assert_eq!(
            output_path(input, ExportFormat::Summary, Some(out)).unwrap(),
            Some(PathBuf::from("track.csv"))
        );
    }

    #[test]
    fn test_output_path_rejects_input_as_output() {
        let input = Path::new("log.csv");
        assert!(output_path(input, ExportFormat::Csv, Some(input)).is_err());
    }

    #[test]
    fn test_output_path_rejects_alias_of_input() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut log = NamedTempFile::new().unwrap();
        log.write_all(&[0x06, 0x01, 0x20, 0xFF]).unwrap();
        log.flush().unwrap();

        let dir = log.path().parent().unwrap();
        let name = log.path().file_name().unwrap();
        let alias = dir.join(".").join(name);

        assert!(output_path(log.path(), ExportFormat::Jsonl, Some(alias.as_path())).is_err());
        assert_eq!(fs::read(log.path()).unwrap(), vec![0x06, 0x01, 0x20, 0xFF]);
    }

    #[test]
    fn test_export_summary_to_writer() {
        let frames = decode(&[0u8; 4], 4).unwrap();
        let config = Config {
            export: flight_record::config::ExportConfig {
                format: ExportFormat::Summary,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut out = Vec::new();
        export(&frames, &config, &mut out).unwrap();
        assert!(!out.is_empty());
    }
}
