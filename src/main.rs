//! fsbelt - a filesystem tool-belt.
//!
//! Usage:
//!   fsb analyze [-p PATH]         Scan a tree, emit JSON or sjson
//!   fsb bulk-rename -p DIR ...    Regex-rename files in bulk
//!   fsb encrypt / decrypt         AES-256-OFB stream encryption
//!   fsb gzip / gunzip             Gzip compression
//!   fsb base64 encode|decode      Base64 encoding
//!   fsb tar pack|unpack           Tar packaging with optional layers
//!   fsb --help                    Show help

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use fsbelt_core::{LengthPrefixWriter, pretty_bytes, write_entity_stream};
use fsbelt_ops::RenameOptions;
use fsbelt_scan::{ScanOptions, ScanOutcome, Scanner};
use fsbelt_stream::{GzipHeader, GzipLevel, PackOptions};

#[derive(Parser)]
#[command(
    name = "fsbelt",
    version,
    about = "A filesystem tool-belt",
    long_about = "fsbelt bundles everyday filesystem chores into one binary: a \
                  concurrent disk-usage analyzer, regex bulk rename, stream \
                  encryption, gzip, base64, and tar packaging."
)]
struct Cli {
    /// Log verbosity, written to stderr (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory tree and emit its entity tree with sizes
    #[command(visible_alias = "sa")]
    Analyze(AnalyzeArgs),

    /// Rename files in bulk using regex named capture groups
    #[command(name = "bulk-rename", visible_alias = "bkrn")]
    BulkRename(BulkRenameArgs),

    /// Encrypt a stream with AES-256-OFB
    #[command(visible_alias = "encr")]
    Encrypt(CryptArgs),

    /// Decrypt a stream produced by `encrypt`
    #[command(visible_alias = "dcry")]
    Decrypt(CryptArgs),

    /// Gzip-compress a stream
    #[command(visible_alias = "gz")]
    Gzip(GzipArgs),

    /// Decompress a gzip stream
    #[command(visible_alias = "guz")]
    Gunzip(GunzipArgs),

    /// Base64 encode or decode
    #[command(visible_alias = "b64")]
    Base64 {
        #[command(subcommand)]
        direction: Base64Command,
    },

    /// Package or unpack tar archives
    Tar {
        #[command(subcommand)]
        action: TarCommand,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Root path to scan
    #[arg(short = 'p', long, default_value = ".")]
    root: PathBuf,

    /// Maximum recursion depth (-1 = unlimited)
    #[arg(short = 'm', long, default_value_t = -1)]
    max_recursion: i64,

    /// Compute SHA-512 content hashes for regular files
    #[arg(short = 'c', long)]
    hashes: bool,

    /// Worker threads (0 = logical CPU count)
    #[arg(short = 'j', long, default_value_t = 0)]
    workers: usize,

    /// Output format
    #[arg(short = 'f', long, default_value = "json")]
    format: AnalyzeFormat,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum AnalyzeFormat {
    /// One pretty-printed JSON tree
    #[default]
    Json,
    /// Length-prefixed JSON objects, children before parents
    Sjson,
}

#[derive(Args)]
struct BulkRenameArgs {
    /// Directory whose files are renamed
    #[arg(short = 'p', long)]
    root: PathBuf,

    /// Pattern with named capture groups, matched against file names
    #[arg(short = 'r', long)]
    pattern: String,

    /// Replacement template; reference captures as $name or ${name}
    #[arg(short = 'd', long)]
    template: String,

    /// Recurse into subdirectories
    #[arg(short = 's', long)]
    recursive: bool,

    /// Print the rename plan without touching anything
    #[arg(short = 't', long)]
    dry_run: bool,
}

#[derive(Args)]
struct CryptArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    passphrase: PassphraseArgs,
}

#[derive(Args)]
struct PassphraseArgs {
    /// Passphrase (visible in the process list; prefer the prompt or a file)
    #[arg(long, conflicts_with = "passphrase_file")]
    passphrase: Option<String>,

    /// Read the passphrase from a file
    #[arg(long)]
    passphrase_file: Option<PathBuf>,
}

impl PassphraseArgs {
    /// Flag, file, or interactive prompt, in that order.
    fn resolve(&self, confirm: bool) -> Result<Vec<u8>> {
        if let Some(passphrase) = &self.passphrase {
            return Ok(passphrase.clone().into_bytes());
        }
        if let Some(path) = &self.passphrase_file {
            let mut data = fs::read(path)
                .with_context(|| format!("Failed to read passphrase file {}", path.display()))?;
            while data.last().is_some_and(|byte| matches!(byte, b'\n' | b'\r')) {
                data.pop();
            }
            return Ok(data);
        }
        let passphrase = rpassword::prompt_password("Passphrase: ")?;
        if confirm {
            let again = rpassword::prompt_password("Confirm passphrase: ")?;
            if passphrase != again {
                bail!("passphrases do not match");
            }
        }
        Ok(passphrase.into_bytes())
    }
}

#[derive(Args)]
struct GzipArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Compression level
    #[arg(long, default_value = "default")]
    level: LevelArg,

    /// Header field: original file name
    #[arg(long)]
    name: Option<String>,

    /// Header field: free-form comment
    #[arg(long)]
    comment: Option<String>,
}

#[derive(Args)]
struct GunzipArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum LevelArg {
    None,
    Fast,
    #[default]
    Default,
    Best,
}

impl From<LevelArg> for GzipLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::None => GzipLevel::None,
            LevelArg::Fast => GzipLevel::Fast,
            LevelArg::Default => GzipLevel::Default,
            LevelArg::Best => GzipLevel::Best,
        }
    }
}

#[derive(Subcommand)]
enum Base64Command {
    /// Encode input to base64
    #[command(visible_alias = "e")]
    Encode(Base64EncodeArgs),

    /// Decode base64 input
    #[command(visible_alias = "d")]
    Decode(Base64DecodeArgs),
}

#[derive(Args)]
struct Base64EncodeArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Inline text input instead of a file
    #[arg(short = 't', long)]
    text: Option<String>,

    /// Use the url-safe alphabet
    #[arg(short = 'u', long)]
    url_safe: bool,

    /// Omit padding
    #[arg(short = 'n', long)]
    no_padding: bool,
}

#[derive(Args)]
struct Base64DecodeArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Inline text input instead of a file
    #[arg(short = 't', long)]
    text: Option<String>,

    /// Expect the url-safe alphabet
    #[arg(short = 'u', long)]
    url_safe: bool,

    /// Expect unpadded input
    #[arg(short = 'n', long)]
    no_padding: bool,

    /// Try every alphabet until one decodes
    #[arg(long)]
    robust: bool,
}

#[derive(Subcommand)]
enum TarCommand {
    /// Package paths into a tar archive
    Pack(TarPackArgs),

    /// Unpack a tar archive into a directory
    Unpack(TarUnpackArgs),
}

#[derive(Args)]
struct TarPackArgs {
    /// Paths to package
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Gzip the archive
    #[arg(short = 'z', long)]
    gzip: bool,

    /// Compression level when gzip is enabled
    #[arg(long, default_value = "default")]
    level: LevelArg,

    /// Encrypt the archive
    #[arg(short = 'e', long)]
    encrypt: bool,

    #[command(flatten)]
    passphrase: PassphraseArgs,
}

#[derive(Args)]
struct TarUnpackArgs {
    /// Input file (defaults to stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Destination directory, created when absent
    #[arg(short = 'C', long, default_value = ".")]
    dest: PathBuf,

    /// Archive is gzipped
    #[arg(short = 'z', long)]
    gzip: bool,

    /// Archive is encrypted
    #[arg(short = 'e', long)]
    encrypt: bool,

    #[command(flatten)]
    passphrase: PassphraseArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::BulkRename(args) => run_bulk_rename(args),
        Command::Encrypt(args) => run_encrypt(args),
        Command::Decrypt(args) => run_decrypt(args),
        Command::Gzip(args) => run_gzip(args),
        Command::Gunzip(args) => run_gunzip(args),
        Command::Base64 { direction } => match direction {
            Base64Command::Encode(args) => run_base64_encode(args),
            Base64Command::Decode(args) => run_base64_decode(args),
        },
        Command::Tar { action } => match action {
            TarCommand::Pack(args) => run_tar_pack(args),
            TarCommand::Unpack(args) => run_tar_unpack(args),
        },
    }
}

fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Scan and serialize. Entity data goes to the selected output, the summary
/// to stderr so piping stays clean.
fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let max_depth = match args.max_recursion {
        depth if depth < 0 => None,
        depth => Some(u32::try_from(depth).context("Recursion depth out of range")?),
    };
    let options = ScanOptions::builder()
        .root(args.root)
        .max_depth(max_depth)
        .compute_hashes(args.hashes)
        .workers(args.workers)
        .build()?;

    let scanner = Scanner::new();
    let cancel = scanner.cancel_flag();
    ctrlc::set_handler(move || {
        eprintln!("interrupt received, cancelling scan");
        cancel.cancel();
    })
    .context("Failed to install interrupt handler")?;

    let ScanOutcome { root, stats } = scanner.scan(&options).context("Scan failed")?;

    let mut output = open_output(args.output.as_deref())?;
    match args.format {
        AnalyzeFormat::Json => {
            serde_json::to_writer_pretty(&mut output, &root)?;
            output.write_all(b"\n")?;
        }
        AnalyzeFormat::Sjson => {
            let mut writer = LengthPrefixWriter::new(&mut output);
            write_entity_stream(&mut writer, root)?;
        }
    }
    output.flush()?;

    eprintln!(
        "Scanned {} entities ({}) in {:.2}s",
        stats.entity_count(),
        pretty_bytes(stats.total_size),
        stats.duration.as_secs_f64()
    );
    if stats.failed > 0 {
        eprintln!("{} entries reported errors", stats.failed);
    }
    Ok(())
}

fn run_bulk_rename(args: BulkRenameArgs) -> Result<()> {
    let mut options = RenameOptions::new(&args.root, &args.pattern, &args.template)?;
    options.recursive = args.recursive;
    options.dry_run = args.dry_run;

    let outcome = fsbelt_ops::run(&options)?;
    if outcome.entries.is_empty() {
        eprintln!("no file names matched the pattern");
        return Ok(());
    }
    if args.dry_run {
        println!("dry run, listing potential renames");
        for entry in outcome.entries.iter().filter(|entry| entry.changed) {
            println!("{} => {}", entry.original, entry.renamed);
        }
    } else {
        eprintln!(
            "renamed {} of {} matched files",
            outcome.applied,
            outcome.entries.len()
        );
    }
    Ok(())
}

fn run_encrypt(args: CryptArgs) -> Result<()> {
    let passphrase = args.passphrase.resolve(true)?;
    let mut input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    fsbelt_stream::encrypt(&mut input, &mut output, &passphrase)?;
    output.flush()?;
    Ok(())
}

fn run_decrypt(args: CryptArgs) -> Result<()> {
    let passphrase = args.passphrase.resolve(false)?;
    let input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    fsbelt_stream::decrypt(input, &mut output, &passphrase)?;
    output.flush()?;
    Ok(())
}

fn run_gzip(args: GzipArgs) -> Result<()> {
    let header = GzipHeader {
        name: args.name,
        comment: args.comment,
    };
    let mut input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    fsbelt_stream::compress(&mut input, &mut output, args.level.into(), &header)?;
    output.flush()?;
    Ok(())
}

fn run_gunzip(args: GunzipArgs) -> Result<()> {
    let input = open_input(args.input.as_deref())?;
    let mut output = open_output(args.output.as_deref())?;
    fsbelt_stream::decompress(input, &mut output)?;
    output.flush()?;
    Ok(())
}

fn run_base64_encode(args: Base64EncodeArgs) -> Result<()> {
    let data = read_all_input(args.text.as_deref(), args.input.as_deref())?;
    let encoded = fsbelt_stream::encode(&data, args.url_safe, args.no_padding);
    let mut output = open_output(args.output.as_deref())?;
    writeln!(output, "{encoded}")?;
    output.flush()?;
    Ok(())
}

fn run_base64_decode(args: Base64DecodeArgs) -> Result<()> {
    let data = read_all_input(args.text.as_deref(), args.input.as_deref())?;
    let trimmed = data.trim_ascii();
    let decoded = if args.robust {
        fsbelt_stream::robust_decode(trimmed)?
    } else {
        fsbelt_stream::decode(trimmed, args.url_safe, args.no_padding)?
    };
    let mut output = open_output(args.output.as_deref())?;
    output.write_all(&decoded)?;
    output.flush()?;
    Ok(())
}

fn run_tar_pack(args: TarPackArgs) -> Result<()> {
    let options = PackOptions {
        gzip: args.gzip.then(|| args.level.into()),
        passphrase: if args.encrypt {
            Some(args.passphrase.resolve(true)?)
        } else {
            None
        },
    };
    let mut output = open_output(args.output.as_deref())?;
    fsbelt_stream::pack(&args.inputs, &mut output, &options)?;
    output.flush()?;
    Ok(())
}

fn run_tar_unpack(args: TarUnpackArgs) -> Result<()> {
    let options = PackOptions {
        gzip: args.gzip.then(GzipLevel::default),
        passphrase: if args.encrypt {
            Some(args.passphrase.resolve(false)?)
        } else {
            None
        },
    };
    let input = open_input(args.input.as_deref())?;
    fsbelt_stream::unpack(input, &args.dest, &options)?;
    Ok(())
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn read_all_input(text: Option<&str>, path: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(text) = text {
        return Ok(text.as_bytes().to_vec());
    }
    let mut input = open_input(path)?;
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_crypt_aliases_parse() {
        let cli = Cli::try_parse_from(["fsb", "encr", "--passphrase", "pw"]).unwrap();
        assert!(matches!(cli.command, Command::Encrypt(_)));

        let cli = Cli::try_parse_from(["fsb", "dcry", "--passphrase", "pw"]).unwrap();
        assert!(matches!(cli.command, Command::Decrypt(_)));
    }
}
