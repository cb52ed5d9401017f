use super::command::{CommandBuilder, object_path};
use super::compdb::{self, CompileCommand};
use super::executor::CommandExecutor;
use super::feedback::FeedbackAnalyzer;
use super::link::{library_files, link_required};
use super::options::BuildOptions;
use super::registry::{FileKind, FileRegistry, ProjectFile};
use super::scheduler::{BuildStatus, BuildTask, CompileReport, Scheduler, TaskState};
use crate::config::{Config, Platform, resolve};
use crate::dsl::EvalContext;
use crate::error::BuildError;
use crate::graph::DependencyGraph;
use crate::pkg_config::FlagResolver;
use crate::ui::Table;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{debug, warn};

/// What a successful pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub status: BuildStatus,
    pub compiled: usize,
    pub linked: bool,
    pub header_only: bool,
}

/// A loaded config together with its scanned sources and include graph.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    /// Names the object subdirectory, so configs do not share objects.
    pub config_stem: String,
    pub registry: FileRegistry,
    pub graph: DependencyGraph,
}

impl Project {
    /// Load the config named by `options` for the host platform.
    pub fn load(options: &BuildOptions, resolver: &dyn FlagResolver) -> Result<Self, BuildError> {
        let platform = Platform::host();
        let ctx = EvalContext::new(platform.name.clone());
        Self::load_with(options, &ctx, platform, resolver)
    }

    pub fn load_with(
        options: &BuildOptions,
        ctx: &EvalContext,
        platform: Platform,
        resolver: &dyn FlagResolver,
    ) -> Result<Self, BuildError> {
        let path = options.config_path();
        let config = Config::load(&path, ctx, platform, resolver)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
        Ok(Self::scan(
            &options.root,
            config,
            stem,
            options.export_prefix.as_deref(),
        ))
    }

    pub fn from_config(root: &Path, config: Config, config_stem: impl Into<String>) -> Self {
        Self::scan(root, config, config_stem, None)
    }

    /// Scan the source roots and add every source to the include graph.
    /// `<export_prefix>/include` is searched last when it exists.
    pub fn scan(
        root: &Path,
        config: Config,
        config_stem: impl Into<String>,
        export_prefix: Option<&Path>,
    ) -> Self {
        let registry = FileRegistry::scan(root, &config);
        let mut include_paths: Vec<PathBuf> = config
            .include_folders
            .iter()
            .map(|folder| resolve(root, folder))
            .collect();
        if let Some(installed) = export_prefix.map(|prefix| prefix.join("include"))
            && installed.is_dir()
        {
            debug!(path = %installed.display(), "searching exported headers");
            include_paths.push(installed);
        }
        let mut graph = DependencyGraph::new();
        for file in registry.sources() {
            graph.add(&file.path, &include_paths);
        }
        debug!(
            files = registry.files().len(),
            nodes = graph.len(),
            "project scanned"
        );
        Self {
            root: root.to_path_buf(),
            config,
            config_stem: config_stem.into(),
            registry,
            graph,
        }
    }

    pub fn object_for(&self, file: &ProjectFile) -> PathBuf {
        object_path(
            &self.root,
            &self.config_stem,
            &file.relative,
            &self.config.platform.object_ext,
        )
    }

    pub fn binary(&self) -> PathBuf {
        self.root.join(self.config.binary_path())
    }

    pub fn commands(&self, debug: bool) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.config, &self.root, debug)
    }

    /// Forced, missing object, or something in the include tree is newer
    /// than the object.
    pub fn is_stale(&self, file: &ProjectFile, full_rebuild: bool) -> bool {
        if full_rebuild {
            return true;
        }
        let object = self.object_for(file);
        match fs::metadata(&object).and_then(|m| m.modified()) {
            Ok(built) => self.graph.need_rebuild(&file.path, built),
            Err(_) => true,
        }
    }

    /// Every source with its staleness, in registry order.
    pub fn staleness(&self, full_rebuild: bool) -> Vec<(&ProjectFile, bool)> {
        let sources: Vec<&ProjectFile> = self.registry.sources().collect();
        sources
            .par_iter()
            .map(|file| (*file, self.is_stale(file, full_rebuild)))
            .collect()
    }

    /// One pending task per stale source.
    pub fn plan(&self, options: &BuildOptions) -> Vec<BuildTask> {
        let commands = self.commands(options.debug);
        self.staleness(options.full_rebuild)
            .into_iter()
            .filter(|(_, stale)| *stale)
            .map(|(file, _)| {
                let object = self.object_for(file);
                let command = commands.compile(&file.path, &object);
                BuildTask::new(
                    file.path.clone(),
                    file.relative.display().to_string(),
                    object,
                    command,
                )
            })
            .collect()
    }

    /// Compile every stale source, then link or archive if needed.
    pub fn build(
        &self,
        options: &BuildOptions,
        executor: &dyn CommandExecutor,
    ) -> Result<BuildSummary, BuildError> {
        let start = Instant::now();
        if options.verbose {
            self.list_files();
        }
        if self.registry.is_header_only() {
            println!("{} Header only library ready", "✓".green());
            return Ok(BuildSummary {
                status: BuildStatus::NoChange,
                compiled: 0,
                linked: false,
                header_only: true,
            });
        }

        let mut tasks = self.plan(options);
        let report = if tasks.is_empty() {
            CompileReport::default()
        } else {
            self.compile(&mut tasks, options, executor)
        };

        let failed = report.status == BuildStatus::Failed;
        if failed {
            println!("{} Compilation failed", "x".red());
        }
        for line in task_diagnostics(&tasks, options.show_warnings) {
            println!("{line}");
        }
        if failed {
            return Err(BuildError::Compile {
                failed: report.failed,
            });
        }
        if !tasks.is_empty() {
            self.write_compile_commands(options.debug);
        }

        let objects: Vec<PathBuf> = self
            .registry
            .sources()
            .map(|file| self.object_for(file))
            .collect();
        let latest_object = self.newest_object().into_iter().chain(report.latest_object).max();
        let binary = self.binary();
        let libraries = library_files(&self.config, &self.root);

        let summary = BuildSummary {
            status: report.status,
            compiled: tasks.len(),
            linked: false,
            header_only: false,
        };
        if !link_required(&binary, latest_object, &libraries, options.force_linking) {
            if report.status == BuildStatus::NoChange {
                println!("{} Up to date", "⚡".green());
            }
            return Ok(summary);
        }

        self.link(&objects, &binary, options, executor)?;
        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            start.elapsed()
        );
        Ok(BuildSummary {
            linked: true,
            ..summary
        })
    }

    fn compile(
        &self,
        tasks: &mut [BuildTask],
        options: &BuildOptions,
        executor: &dyn CommandExecutor,
    ) -> CompileReport {
        let pb = ProgressBar::new(tasks.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Compiling...");

        let report = Scheduler::new(executor, self.config.threads)
            .with_progress(pb.clone())
            .echo_commands(options.echo_commands)
            .run(tasks);

        pb.finish_and_clear();
        report
    }

    fn link(
        &self,
        objects: &[PathBuf],
        binary: &Path,
        options: &BuildOptions,
        executor: &dyn CommandExecutor,
    ) -> Result<(), BuildError> {
        if let Some(dir) = binary.parent() {
            fs::create_dir_all(dir).map_err(|e| BuildError::fs(dir, e))?;
        }
        // `ar rcs` appends to an existing archive.
        if self.config.is_library() && binary.exists() {
            fs::remove_file(binary).map_err(|e| BuildError::fs(binary, e))?;
        }

        let command = self.commands(options.debug).finish(objects, binary);
        if options.echo_commands {
            println!("{}", command.to_shell());
        }
        println!("   {} Linking...", "🔗".cyan());
        let out = executor.run(&command);
        if !out.success {
            println!("{}", out.output);
            if let Some(hint) = FeedbackAnalyzer::analyze(&out.output) {
                println!("{} {}", "!".yellow(), hint);
            }
            println!("{} Linking failed", "x".red());
            return Err(BuildError::Link {
                binary: binary.to_path_buf(),
                output: out.output,
            });
        }
        Ok(())
    }

    fn write_compile_commands(&self, debug: bool) {
        let commands = self.commands(debug);
        let entries: Vec<CompileCommand> = self
            .registry
            .sources()
            .map(|file| {
                let cmd = commands.compile(&file.path, &self.object_for(file));
                CompileCommand::new(&self.root, &file.path, &cmd)
            })
            .collect();
        match compdb::write(&self.root, &entries) {
            Ok(path) => debug!(path = %path.display(), "compile database written"),
            Err(e) => warn!(error = %e, "could not write compile database"),
        }
    }

    /// Print the staleness decision for every source without compiling.
    pub fn dependency_report(&self, full_rebuild: bool) -> Vec<(PathBuf, bool)> {
        let decisions: Vec<(PathBuf, bool)> = self
            .staleness(full_rebuild)
            .into_iter()
            .map(|(file, stale)| (file.relative.clone(), stale))
            .collect();
        for (file, stale) in &decisions {
            if *stale {
                println!("{} {} needs rebuild", "•".cyan(), file.display());
            } else {
                println!("{} {} up to date", "✓".green(), file.display());
            }
        }
        let stale = decisions.iter().filter(|(_, s)| *s).count();
        println!(
            "{} {} of {} translation unit(s) stale",
            "•".cyan(),
            stale,
            decisions.len()
        );
        decisions
    }

    /// The include tree of every source.
    pub fn dependency_trees(&self) -> String {
        self.registry
            .sources()
            .map(|file| self.graph.render_tree(&file.path))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_dependencies(&self) {
        print!("{}", self.dependency_trees());
    }

    fn list_files(&self) {
        let mut table = Table::new(&["File", "Kind", "Object"]);
        for file in self.registry.files() {
            let (kind, object) = match file.kind {
                FileKind::Source => ("source", self.object_for(file).display().to_string()),
                FileKind::Header => ("header", String::from("-")),
            };
            table.add_row(vec![
                file.relative.display().to_string(),
                kind.to_string(),
                object,
            ]);
        }
        if !table.is_empty() {
            table.print();
        }
    }

    /// The newest of the artifact's inputs, if any object exists.
    pub fn newest_object(&self) -> Option<SystemTime> {
        self.registry
            .sources()
            .filter_map(|f| fs::metadata(self.object_for(f)).and_then(|m| m.modified()).ok())
            .max()
    }
}

/// Compiler output worth showing after the barrier, in task order: every
/// failure with its hint, and non-empty output of succeeded tasks when
/// warnings were asked for.
fn task_diagnostics(tasks: &[BuildTask], show_warnings: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for task in tasks {
        match task.state {
            TaskState::Failed => {
                lines.push(format!("{} {}:\n{}", "x".red(), task.label.bold(), task.output));
                if let Some(hint) = FeedbackAnalyzer::analyze(&task.output) {
                    lines.push(format!("{} {}", "!".yellow(), hint));
                }
            }
            TaskState::Succeeded if show_warnings && !task.output.trim().is_empty() => {
                lines.push(format!(
                    "{} Warning in {}:\n{}",
                    "!".yellow(),
                    task.label,
                    task.output
                ));
            }
            _ => {}
        }
    }
    lines
}
