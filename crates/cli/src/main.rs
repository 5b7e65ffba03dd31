mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extbuild_lib::LanguageLevel;
use extbuild_lib::consts::{APP_NAME, CONFIG_FILE_NAME};

use crate::output::{OutputFormat, print_error};

/// extbuild - Build native extension modules from annotated sources
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Translate, compile and link every target in the build file
  Build {
    /// Path to the build file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Source language level (2 or 3), overriding the build file
    #[arg(long)]
    language_level: Option<LanguageLevel>,

    /// Build directory, overriding the build file
    #[arg(long)]
    build_dir: Option<PathBuf>,
  },

  /// Show the commands a build would run (dry-run)
  Plan {
    /// Path to the build file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
  },

  /// Remove the build directory
  Clean {
    /// Path to the build file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  // Commands print target failures themselves.
  let default_level = if cli.verbose { "debug" } else { "error" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      config,
      language_level,
      build_dir,
    } => cmd::cmd_build(&config, language_level, build_dir, cli.format),
    Commands::Plan { config } => cmd::cmd_plan(&config, cli.format),
    Commands::Clean { config } => cmd::cmd_clean(&config, cli.format),
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
