//! Command-line front end for polyzone annotation sets.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use polyzone::config::{AppConfig, ConfigError};
use polyzone::decode::DecodeError;
use polyzone::geometry::centroid;
use polyzone::{AnnotationBoard, AnnotationSet, BoardError, FormatError, ImageFile, IngestError, ZoneType};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("no decode result for {0:?}")]
    NoDecodeResult(PathBuf),
}

#[derive(Parser, Debug)]
#[command(name = "polyzone", version, about = "Polygon zone annotation sets")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output; repeat for more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and decode an image, then emit an empty annotation set for it
    Ingest {
        image: PathBuf,
        #[arg(short, long, help = "Output file, stdout if omitted")]
        output: Option<PathBuf>,
    },
    /// Summarize an annotation set
    Inspect { set: PathBuf },
    /// Load an annotation set and write it back in canonical form
    Normalize {
        set: PathBuf,
        #[arg(short, long, help = "Output file, stdout if omitted")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Application error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, cli.verbose);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Application error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => Ok(AppConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn init_logging(config: &AppConfig, verbose: u8) {
    let mut level = config.preferences.log_level;
    for _ in 0..verbose {
        level = level.more_verbose();
    }
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();
}

fn run(command: Command, config: &AppConfig) -> Result<(), CliError> {
    match command {
        Command::Ingest { image, output } => run_ingest(config, &image, output.as_deref()),
        Command::Inspect { set } => run_inspect(config, &set),
        Command::Normalize { set, output } => run_normalize(config, &set, output.as_deref()),
    }
}

fn run_ingest(config: &AppConfig, image: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let file = ImageFile::from_path(image)?;
    let mut board = AnnotationBoard::new(config.canvas.clone());
    board.ingest(Some(file))?;

    match board.wait_for_ingestion() {
        Some(Ok(size)) => log::info!("Surface {:.0}x{:.0}", size.width, size.height),
        Some(Err(e)) => return Err(e.into()),
        None => return Err(CliError::NoDecodeResult(image.to_path_buf())),
    }

    emit(&board.save()?, output)
}

fn run_inspect(config: &AppConfig, path: &Path) -> Result<(), CliError> {
    let mut board = AnnotationBoard::new(config.canvas.clone());
    board.load(AnnotationSet::read(path)?);

    let surface = board.stage_size();
    match board.image() {
        Some(image) => println!("image: {}", image.reference),
        None => println!("image: (none)"),
    }
    println!("surface: {:.0}x{:.0}", surface.width, surface.height);
    println!("polygons: {}", board.len());

    for layer in board.layers() {
        let Some(editor) = board.editor(&layer.id) else {
            continue;
        };
        let vertices = editor.vertices().len();
        let centre = if vertices > 0 {
            let c = centroid(&editor.outline());
            format!("({:.1}, {:.1})", c.x, c.y)
        } else {
            "-".to_string()
        };
        let mut flags = Vec::new();
        if !layer.complete {
            flags.push("open");
        }
        if layer.locked {
            flags.push("locked");
        }
        if layer.active {
            flags.push("active");
        }
        println!(
            "  {:>3}. {:<16} {:>3} vertices  centre {:<16} {}  {}",
            layer.index,
            layer.label,
            vertices,
            centre,
            layer.id,
            flags.join(",")
        );
    }

    for zone_type in ZoneType::all() {
        let count = board.zone_count(*zone_type);
        if count > 0 {
            println!("{}: {}", zone_type.label(), count);
        }
    }
    Ok(())
}

fn run_normalize(config: &AppConfig, path: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let mut board = AnnotationBoard::new(config.canvas.clone());
    board.load(AnnotationSet::read(path)?);
    emit(&board.save()?, output)
}

fn emit(set: &AnnotationSet, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => set.write(path)?,
        None => println!("{}", set.to_json()?),
    }
    Ok(())
}
