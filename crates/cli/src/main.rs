use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use imgren_core::{
    app_paths, load_config, load_config_from, AppConfig, DirectoryPolicy, OperationReport,
    RenameEngine, RenameError, RunOptions,
};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "imgren", version)]
#[command(about = "Rename pictures after their EXIF capture time, and put them back")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Folder holding the pictures and the names log
    #[arg(short = 'f', long, global = true, default_value = ".")]
    folder: PathBuf,
    /// strftime mask of the new names
    #[arg(short = 'd', long = "dst-mask", global = true)]
    dst_mask: Option<String>,
    /// Extension appended to the new names (empty or starting with '.')
    #[arg(short = 'e', long = "ext", global = true, allow_hyphen_values = true)]
    ext_mask: Option<String>,
    /// Name of the names log inside the folder
    #[arg(short = 'r', long = "ref-file", global = true)]
    ref_file: Option<String>,
    /// Pattern used when no file is given
    #[arg(short = 's', long = "src-mask", global = true)]
    src_mask: Option<String>,
    /// Minutes added to every capture time
    #[arg(
        short = 'x',
        long,
        global = true,
        default_value_t = 0.0,
        allow_hyphen_values = true
    )]
    delta: f64,
    /// Print every planned move
    #[arg(short = 'D', long, global = true, default_value_t = false)]
    debug: bool,
    /// Show what would happen without touching any file
    #[arg(short = 'X', long = "dry-run", global = true, default_value_t = false)]
    dry_run: bool,
    /// Run rename and back inside selected directories too
    #[arg(short = 'R', long, global = true, default_value_t = false)]
    recurse: bool,
    /// Configuration file to read instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rename pictures after their capture time
    Rename(FilesArgs),
    /// Give renamed pictures their original names back
    Back(FilesArgs),
    /// Copy pictures from another folder into this one
    Merge(MergeArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct FilesArgs {
    files: Vec<String>,
}

#[derive(Debug, Args)]
struct MergeArgs {
    src_folder: PathBuf,
    files: Vec<String>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.global);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("imgren: {err:#}");
            let code = err
                .downcast_ref::<RenameError>()
                .map_or(1, RenameError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn setup_logging(args: &GlobalArgs) {
    let level = match (args.verbose, args.debug) {
        (_, true) => log::LevelFilter::Debug,
        (0, _) => log::LevelFilter::Warn,
        (1, _) => log::LevelFilter::Info,
        (2, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    let app_config = match &global.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let opts = RunOptions {
        delta: global.delta,
        debug: global.debug,
        dry_run: global.dry_run,
    };

    match cli.command {
        Commands::Rename(args) => {
            let engine = build_engine(&global, &app_config)?;
            let report = engine.rename(&args.files, &opts)?;
            emit(global.output, "renamed", &report)
        }
        Commands::Back(args) => {
            let engine = build_engine(&global, &app_config)?;
            let report = engine.back(&args.files, &opts)?;
            emit(global.output, "restored", &report)
        }
        Commands::Merge(args) => {
            let engine = build_engine(&global, &app_config)?;
            let report = engine.merge(&args.files, &args.src_folder, &opts)?;
            emit(global.output, "copied", &report)
        }
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(&global, &app_config),
        },
    }
}

fn emit(output: OutputFormat, operation: &str, report: &OperationReport) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Table => print_table(operation, report),
    }
    Ok(())
}

fn build_engine(args: &GlobalArgs, app_config: &AppConfig) -> Result<RenameEngine> {
    let mut config = app_config.renamer_config(&args.folder);
    if let Some(mask) = &args.dst_mask {
        config.dst_mask = mask.clone();
    }
    if let Some(ext) = &args.ext_mask {
        config.ext_mask = ext.clone();
    }
    if let Some(ref_file) = &args.ref_file {
        config.ref_file = ref_file.clone();
    }
    if let Some(src_mask) = &args.src_mask {
        config.src_mask = src_mask.clone();
    }
    if args.recurse {
        config.directory_policy = DirectoryPolicy::Recurse;
    }
    debug!("effective configuration: {config:?}");
    Ok(RenameEngine::new(config)?)
}

fn cmd_config_show(args: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => app_paths()?.config_path,
    };
    println!("config file: {}", path.display());
    println!(
        "{}",
        toml::to_string_pretty(config).context("cannot serialize configuration")?
    );
    Ok(())
}

fn print_table(operation: &str, report: &OperationReport) {
    for change in &report.changes {
        println!("{} -> {}", change.from.display(), change.to.display());
    }

    let suffix = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "\n{operation} {} file(s){suffix}, {} skipped",
        report.changes.len(),
        report.notices.len()
    );
}
