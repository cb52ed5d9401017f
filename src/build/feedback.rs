use colored::*;

pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    /// A hint for well-known compiler or linker diagnostics in `output`.
    pub fn analyze(output: &str) -> Option<String> {
        // Missing entry point
        if output.contains("undefined reference to `main'")
            || output.contains("undefined reference to `WinMain")
            || output.contains("entry point must be defined")
        {
            return Some(format!(
                "Your project is missing a {} function.\nEnsure you have a valid entry point or set {} if this is a library.",
                "main()".bold().yellow(),
                "output = \"library\"".bold().green()
            ));
        }

        if output.contains("undefined reference to") || output.contains("cannot find -l") {
            return Some(format!(
                "It looks like a {} error.\nYou might be missing a library in {}.\nCheck {} if it lives outside the system paths.",
                "Linker".bold().red(),
                "lib = \"...\"".bold().yellow(),
                "libpaths".bold().yellow()
            ));
        }

        if output.contains("fatal error: ") && output.contains("No such file or directory") {
            return Some(format!(
                "It looks like a {} error.\nYou might be missing an include path.\nAdd the directory with {} in your config.",
                "Missing Header".bold().red(),
                "include = \"...\"".bold().yellow()
            ));
        }

        None
    }
}
