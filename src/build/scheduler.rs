//! Bounded-parallel execution of compile tasks.
//!
//! A dispatcher thread walks the task list in order and blocks on a
//! condition variable while every slot is taken. Each task runs on its own
//! scoped worker, which reports back over a channel. The calling thread
//! collects completions until the channel closes, which only happens once
//! every dispatched task has finished.

use super::executor::{CommandExecutor, CommandLine, ExecOutput};
use colored::*;
use indicatif::ProgressBar;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Condvar, Mutex, PoisonError};
use std::thread;
use std::time::SystemTime;
use tracing::{debug, trace};

/// Outcome of a whole pass. Ordered so that `max` widens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BuildStatus {
    #[default]
    NoChange,
    Changed,
    Failed,
}

impl BuildStatus {
    /// Combine with a later event; `Failed` is never downgraded.
    pub fn widen(self, other: BuildStatus) -> BuildStatus {
        self.max(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// One stale translation unit and the command that rebuilds it.
#[derive(Debug, Clone)]
pub struct BuildTask {
    pub source: PathBuf,
    /// Short name for progress lines.
    pub label: String,
    pub object: PathBuf,
    pub command: CommandLine,
    pub state: TaskState,
    /// Everything the compiler printed.
    pub output: String,
}

impl BuildTask {
    pub fn new(
        source: PathBuf,
        label: impl Into<String>,
        object: PathBuf,
        command: CommandLine,
    ) -> Self {
        Self {
            source,
            label: label.into(),
            object,
            command,
            state: TaskState::Pending,
            output: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub status: BuildStatus,
    /// Newest modification time among objects produced by succeeded tasks.
    pub latest_object: Option<SystemTime>,
    pub succeeded: usize,
    pub failed: usize,
    /// Most tasks ever running at once.
    pub peak_running: usize,
}

impl CompileReport {
    fn record(&mut self, done: &Completion) {
        if done.succeeded {
            self.succeeded += 1;
            self.status = self.status.widen(BuildStatus::Changed);
            if let Some(mtime) = done.object_mtime {
                self.latest_object = Some(self.latest_object.map_or(mtime, |t| t.max(mtime)));
            }
        } else {
            self.failed += 1;
            self.status = self.status.widen(BuildStatus::Failed);
        }
    }
}

struct Completion {
    label: String,
    succeeded: bool,
    object_mtime: Option<SystemTime>,
}

#[derive(Default)]
struct SlotState {
    running: usize,
    peak: usize,
}

#[derive(Default)]
struct Slots {
    state: Mutex<SlotState>,
    freed: Condvar,
}

impl Slots {
    fn acquire(&self, budget: usize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while state.running >= budget {
            trace!(running = state.running, budget, "waiting for a free slot");
            state = self
                .freed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.running += 1;
        state.peak = state.peak.max(state.running);
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.running -= 1;
        drop(state);
        self.freed.notify_one();
    }

    fn peak(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .peak
    }
}

pub struct Scheduler<'a> {
    executor: &'a dyn CommandExecutor,
    budget: usize,
    progress: ProgressBar,
    echo_commands: bool,
}

impl<'a> Scheduler<'a> {
    /// A budget of zero is treated as one.
    pub fn new(executor: &'a dyn CommandExecutor, budget: usize) -> Self {
        Self {
            executor,
            budget: budget.max(1),
            progress: ProgressBar::hidden(),
            echo_commands: false,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn echo_commands(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }

    /// Run every task to a terminal state and aggregate the results.
    ///
    /// A failed task does not stop the others; tasks already handed out
    /// always finish before this returns.
    pub fn run(&self, tasks: &mut [BuildTask]) -> CompileReport {
        let slots = Slots::default();
        let (tx, rx) = mpsc::channel::<Completion>();
        let mut report = CompileReport::default();
        debug!(tasks = tasks.len(), budget = self.budget, "compile pass");

        thread::scope(|scope| {
            let slots = &slots;
            scope.spawn(move || {
                for task in tasks {
                    slots.acquire(self.budget);
                    task.state = TaskState::Running;
                    if self.echo_commands {
                        self.progress.println(task.command.to_shell());
                    }
                    let tx = tx.clone();
                    scope.spawn(move || {
                        let completion = self.execute(task);
                        slots.release();
                        if let Err(unsent) = tx.send(completion) {
                            debug!(task = %unsent.0.label, "collector stopped before completion");
                        }
                    });
                }
            });

            for done in rx {
                self.progress.inc(1);
                if done.succeeded {
                    self.progress
                        .println(format!("{} Compiled {}", "✓".green(), done.label));
                } else {
                    self.progress
                        .println(format!("{} Failed {}", "x".red(), done.label.bold()));
                }
                report.record(&done);
            }
        });

        report.peak_running = slots.peak();
        debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            peak = report.peak_running,
            "compile pass finished"
        );
        report
    }

    fn execute(&self, task: &mut BuildTask) -> Completion {
        self.progress.set_message(format!("Compiling {}", task.label));
        let out = match task.object.parent().map(fs::create_dir_all) {
            Some(Err(e)) => ExecOutput::failed(format!(
                "cannot create object directory for {}: {}",
                task.object.display(),
                e
            )),
            _ => self.executor.run(&task.command),
        };

        task.state = if out.success {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };
        task.output = out.output;
        let object_mtime = if out.success {
            fs::metadata(&task.object).and_then(|m| m.modified()).ok()
        } else {
            None
        };
        Completion {
            label: task.label.clone(),
            succeeded: out.success,
            object_mtime,
        }
    }
}
