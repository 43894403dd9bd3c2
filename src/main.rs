use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thumbwright::naming::Renames;
use thumbwright::{Thumbnails, config, output, source};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thumbwright")]
#[command(about = "Batch thumbnail generator driven by TOML recipes")]
#[command(long_about = "\
Batch thumbnail generator driven by TOML recipes

A recipe describes one thumbnail: its size, an optional crop or source
region, watermarks, resampling and the output format. Every input given
to 'run' is turned into one thumbnail using that recipe.

Inputs may be files or directories. Directories are searched recursively
for images with a known extension.

  thumbwright run --recipe thumb.toml photos/
  thumbwright run --recipe thumb.toml --out-dir thumbs --rename suffix-hyphen-thumbnail a.jpg b.png

Run 'thumbwright gen-recipe' to generate a documented recipe.")]
#[command(version)]
struct Cli {
    /// Log pipeline stages (equivalent to RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Recipe file describing the thumbnail
    #[arg(long, short)]
    recipe: PathBuf,

    /// Write thumbnails here (overrides the recipe's [output] directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output naming (overrides the recipe's [output] rename)
    #[arg(long)]
    rename: Option<Renames>,

    /// Print a JSON report instead of the listing
    #[arg(long)]
    json: bool,

    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Make thumbnails of the inputs using a recipe
    Run(RunArgs),
    /// Print a stock recipe with all options documented
    GenRecipe,
    /// List supported image formats and their encoder options
    Formats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args)?,
        Command::GenRecipe => {
            print!("{}", config::stock_recipe_toml());
        }
        Command::Formats => output::print_formats(),
    }

    Ok(())
}

fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = config::load_recipe(&args.recipe)?;
    let base_dir = args
        .recipe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    init_thread_pool(&recipe.processing);

    let inputs = source::collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        return Err("no images found in the given inputs".into());
    }
    info!("Processing {} inputs with {}", inputs.len(), args.recipe.display());

    let thumbnails = recipe.apply(Thumbnails::of_paths(inputs)?, &base_dir)?;
    let rename = args.rename.unwrap_or(recipe.output.rename);
    let out_dir = args
        .out_dir
        .or_else(|| recipe.output.directory.as_ref().map(|dir| base_dir.join(dir)));
    let outcomes = match out_dir {
        Some(dir) => thumbnails.to_dir(&dir, &rename)?,
        None => thumbnails.as_files(&rename)?,
    };

    if args.json {
        output::print_outcomes_json(&outcomes)?;
    } else {
        output::print_outcomes(&outcomes);
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(format!("{} of {} inputs failed", failed, outcomes.len()).into());
    }
    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "thumbwright=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
