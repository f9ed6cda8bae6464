//! GitHub Actions runner integration.
//!
//! Outputs go to the file named by `GITHUB_OUTPUT`; annotations are
//! workflow commands printed on stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use diffwise_core::DiffwiseError;

/// Handle on the runner for the current job step.
///
/// # Examples
///
/// ```
/// use diffwise_review::actions::ActionsRuntime;
///
/// let dir = tempfile::tempdir().unwrap();
/// let output = dir.path().join("output");
/// let runtime = ActionsRuntime::new(Some(output.clone()));
/// runtime.set_output("feedback", "No differences found.").unwrap();
/// assert_eq!(
///     std::fs::read_to_string(output).unwrap(),
///     "feedback=No differences found.\n"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionsRuntime {
    output_file: Option<PathBuf>,
}

impl ActionsRuntime {
    /// Runtime writing outputs to `output_file`, or stdout when `None`.
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    /// Set a step output.
    ///
    /// Multi-line values use the heredoc form the runner expects.
    ///
    /// # Errors
    ///
    /// Returns [`DiffwiseError::Io`] if the output file cannot be written.
    pub fn set_output(&self, name: &str, value: &str) -> Result<(), DiffwiseError> {
        let entry = format_output(name, value);
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(entry.as_bytes())?;
            }
            None => print!("{entry}"),
        }
        Ok(())
    }

    /// Emit a notice annotation.
    pub fn notice(&self, message: &str) {
        println!("{}", workflow_command("notice", message));
    }

    /// Emit a warning annotation.
    pub fn warning(&self, message: &str) {
        println!("{}", workflow_command("warning", message));
    }

    /// Emit an error annotation; the step fails through the exit code.
    pub fn set_failed(&self, message: &str) {
        println!("{}", workflow_command("error", message));
    }
}

fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{name}={value}\n");
    }
    let mut delimiter = String::from("diffwise_EOF");
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Render `::command::message` with the runner's escaping.
pub fn workflow_command(command: &str, message: &str) -> String {
    format!("::{command}::{}", escape_data(message))
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
