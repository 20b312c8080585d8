use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mta_rust_gopkgmap_core::{
    format_output, format_package, GoEnv, OutputFormat, PackageScanner, ScanConfig,
};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gopkgmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify Go package directories and map their imports")]
#[command(long_about = "A Rust-based tool that reads the Go files of a directory and reports, \
    like `go list`, which files make up the package, its internal tests and its external \
    tests, which files the build context excludes, and what each part imports.\n\n\
    GOROOT, GOPATH, GOOS, GOARCH and CGO_ENABLED are read from the environment; the \
    flags below override them. Use --recursive to classify every package under PATH.")]
pub struct Args {
    /// Package directory (or tree root with --recursive)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Classify every package directory under PATH
    #[arg(short, long)]
    pub recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Json)]
    pub format: OutputFormatArg,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated build tags to satisfy
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Target operating system (overrides GOOS)
    #[arg(long)]
    pub goos: Option<String>,

    /// Target architecture (overrides GOARCH)
    #[arg(long)]
    pub goarch: Option<String>,

    /// Go installation root (overrides GOROOT)
    #[arg(long)]
    pub goroot: Option<PathBuf>,

    /// GOPATH workspace (overrides GOPATH)
    #[arg(long)]
    pub gopath: Option<PathBuf>,

    /// Do not satisfy the `cgo` build tag
    #[arg(long)]
    pub no_cgo: bool,

    /// Additional directory ignore patterns (glob style)
    #[arg(long, action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Ignore file path (defaults to .gitignore)
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Descend into vendor directories
    #[arg(long)]
    pub include_vendor: bool,

    /// Only keep packages importing this path (with --recursive)
    #[arg(long)]
    pub imports_of: Option<String>,

    /// Show verbose progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Parallel threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Summary,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Summary => OutputFormat::Summary,
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn go_env(args: &Args) -> GoEnv {
    let mut env = GoEnv::from_env().with_build_tags(args.tags.clone());

    if let Some(ref goos) = args.goos {
        env = env.with_goos(goos.clone());
    }
    if let Some(ref goarch) = args.goarch {
        env = env.with_goarch(goarch.clone());
    }
    if let Some(ref goroot) = args.goroot {
        env = env.with_goroot(goroot.clone());
    }
    if let Some(ref gopath) = args.gopath {
        env = env.with_gopath(gopath.clone());
    }
    if args.no_cgo {
        env = env.with_cgo(false);
    }

    env
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let env = go_env(&args);
    tracing::debug!(
        "GOROOT={} GOOS={} GOARCH={} cgo={}",
        env.goroot.display(),
        env.goos,
        env.goarch,
        env.cgo_enabled
    );

    // Build config
    let mut config = ScanConfig::new(args.path.clone())
        .with_recursive(args.recursive)
        .with_ignore_patterns(args.ignore.clone())
        .with_include_vendor(args.include_vendor)
        .with_threads(args.threads);

    if let Some(ref ignore_file) = args.ignore_file {
        config = config.with_ignore_file(ignore_file.clone());
    }

    // Show progress if verbose
    let spinner = if args.verbose {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning packages...");
        Some(pb)
    } else {
        None
    };

    let scanner = PackageScanner::new(config, env)?;

    let output = if args.recursive {
        let result = scanner.scan()?;

        if let Some(ref pb) = spinner {
            pb.finish_with_message(format!(
                "Classified {} packages in {}ms",
                result.stats.total_packages, result.metadata.scan_duration_ms
            ));
        }

        let filtered = match args.imports_of {
            Some(ref import) => result.filter_importers(import),
            None => result,
        };
        format_output(&filtered, args.format.into())?
    } else {
        // a single directory follows the all-or-nothing contract
        let package = scanner.import_root()?;

        if let Some(ref pb) = spinner {
            pb.finish_with_message(format!("Classified package {}", package.name));
        }

        format_package(&package, args.format.into())?
    };

    // Write output
    if let Some(path) = args.output {
        fs::write(&path, &output)?;
        if args.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{}", output);
    }

    Ok(())
}
