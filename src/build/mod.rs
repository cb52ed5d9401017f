mod command;
mod compdb;
pub mod executor;
mod feedback;
mod link;
mod options;
mod project;
mod registry;
mod scheduler;
mod script;

pub use command::{CommandBuilder, object_path};
pub use compdb::{COMPILE_COMMANDS_FILE, CompileCommand};
pub use executor::{CommandExecutor, CommandLine, ExecOutput, ProcessExecutor};
pub use feedback::FeedbackAnalyzer;
pub use link::{library_files, link_required};
pub use options::BuildOptions;
pub use project::{BuildSummary, Project};
pub use registry::{FileKind, FileRegistry, HEADER_EXTENSIONS, ProjectFile, SOURCE_EXTENSIONS};
pub use scheduler::{BuildStatus, BuildTask, CompileReport, Scheduler, TaskState};
pub use script::{render as render_script, write_script};
