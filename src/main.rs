//! # lzb CLI Entry Point
//!
//! Parses arguments with clap and routes them to the build engine. Running
//! `lzb` with no subcommand builds the project in the current directory.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lzbuild::build::{self, BuildOptions, ProcessExecutor, Project};
use lzbuild::commands;
use lzbuild::config::DEFAULT_CONFIG_FILE;
use lzbuild::pkg_config::{LinkOnly, PkgConfig};
use lzbuild::settings::GlobalSettings;

#[derive(Parser)]
#[command(name = "lzb")]
#[command(about = "Incremental C/C++ build tool", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Args)]
struct BuildArgs {
    /// List every scanned file before building
    #[arg(short, long)]
    verbose: bool,
    /// Report which translation units are stale, then stop
    #[arg(short = 'd', long = "dependencies")]
    dependencies_only: bool,
    /// Recompile every translation unit
    #[arg(short = 'f', long)]
    full_rebuild: bool,
    /// Link even if the artifact looks up to date
    #[arg(short = 'l', long = "force-link")]
    force_link: bool,
    /// Compile and link with debug symbols
    #[arg(short = 'g', long)]
    debug: bool,
    /// Print every compiler and linker command
    #[arg(long)]
    echo_commands: bool,
    /// Print compiler output of successful compiles
    #[arg(long)]
    show_warnings: bool,
    /// Print the include tree of every source
    #[arg(long)]
    print_dependencies: bool,
    /// Config file to use
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Export headers and the artifact here after a successful build
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

impl BuildArgs {
    fn into_options(self, root: &Path) -> BuildOptions {
        BuildOptions {
            verbose: self.verbose,
            dependencies_only: self.dependencies_only,
            full_rebuild: self.full_rebuild,
            force_linking: self.force_link,
            debug: self.debug,
            echo_commands: self.echo_commands,
            show_warnings: self.show_warnings,
            print_dependencies: self.print_dependencies,
            config: self.config,
            root: root.to_path_buf(),
            export_dir: self.export_dir,
            export_prefix: installed_prefix(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and link the project (the default)
    Build(BuildArgs),
    /// Create src/, bin/, obj/ and a starter config here
    Init,
    /// Write a shell script that builds the project without lzb
    Script {
        /// Where to write the script
        output: PathBuf,
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        #[arg(short = 'g', long)]
        debug: bool,
    },
    /// Copy headers and the built artifact under an install prefix
    Export {
        /// Prefix to export to (defaults to `export_path` from settings)
        #[arg(long)]
        export_dir: Option<PathBuf>,
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Generate shell completions
    Completion { shell: Shell },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "lzbuild=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Some(Commands::Build(args)) => args.verbose,
        None => cli.build.verbose,
        _ => false,
    };
    init_tracing(verbose);

    let root = std::env::current_dir().context("Failed to read current directory")?;

    match cli.command {
        Some(Commands::Build(args)) => cmd_build(&root, args),
        None => cmd_build(&root, cli.build),
        Some(Commands::Init) => commands::init::run(&root),
        Some(Commands::Script {
            output,
            config,
            debug,
        }) => cmd_script(&root, config, &output, debug),
        Some(Commands::Export { export_dir, config }) => cmd_export(&root, config, export_dir),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Root of previously exported headers, from the user's settings.
fn installed_prefix() -> Option<PathBuf> {
    match GlobalSettings::load() {
        Ok(settings) => Some(settings.export_root()),
        Err(e) => {
            tracing::warn!("ignoring user settings: {e:#}");
            None
        }
    }
}

/// Load the project or exit non-zero with the config error.
fn load_or_exit(options: &BuildOptions, resolve_libraries: bool) -> Project {
    let pkg_config = PkgConfig::new(&ProcessExecutor);
    let loaded = if resolve_libraries {
        Project::load(options, &pkg_config)
    } else {
        Project::load(options, &LinkOnly)
    };
    match loaded {
        Ok(project) => project,
        Err(e) => {
            println!("{} {}", "x".red(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_build(root: &Path, args: BuildArgs) -> Result<()> {
    let options = args.into_options(root);
    let project = load_or_exit(&options, true);

    if options.print_dependencies {
        project.print_dependencies();
        return Ok(());
    }
    if options.dependencies_only {
        project.dependency_report(options.full_rebuild);
        return Ok(());
    }

    match project.build(&options, &ProcessExecutor) {
        Ok(_) => {
            if let Some(dir) = &options.export_dir {
                commands::export::run(&project, dir);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "x".red(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_script(root: &Path, config: PathBuf, output: &Path, debug: bool) -> Result<()> {
    let options = BuildOptions {
        config,
        ..BuildOptions::in_root(root)
    };
    let project = load_or_exit(&options, false);
    build::write_script(&project, output, debug)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{} Wrote {}", "✓".green(), output.display());
    Ok(())
}

fn cmd_export(root: &Path, config: PathBuf, export_dir: Option<PathBuf>) -> Result<()> {
    let options = BuildOptions {
        config,
        ..BuildOptions::in_root(root)
    };
    let project = load_or_exit(&options, false);
    let target = match export_dir {
        Some(dir) => dir,
        None => GlobalSettings::load()?.export_root(),
    };
    let report = commands::export::run(&project, &target);
    println!(
        "{} {} file(s) exported to {}",
        "✓".green(),
        report.copied.len(),
        target.display()
    );
    Ok(())
}
