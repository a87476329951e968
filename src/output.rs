//! Shared output formatting for taskboard CLI commands.

use serde::Serialize;

use crate::error::{cause_chain, exit_codes, Error, Result};
use crate::view::TaskStats;

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text card for one command result.
///
/// Renders as a title, indented task or category lines, an optional note,
/// aligned fields, then warnings and suggested commands.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    title: String,
    lines: Vec<String>,
    note: Option<String>,
    fields: Vec<(&'static str, String)>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl HumanOutput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// One task or category line
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Free text under the lines: a description or an empty-state hint
    pub fn note(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
    }

    pub fn field(&mut self, key: &'static str, value: impl ToString) {
        self.fields.push((key, value.to_string()));
    }

    pub fn stats(&mut self, stats: TaskStats) {
        self.field("active", stats.active);
        self.field("completed", stats.completed);
        self.field("total", stats.total);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn suggest(&mut self, command: impl Into<String>) {
        self.suggestions.push(command.into());
    }

    pub fn render(&self) -> String {
        let mut out = vec![self.title.clone()];
        out.extend(self.lines.iter().map(|line| format!("  {line}")));

        if let Some(note) = &self.note {
            out.push(String::new());
            out.extend(note.lines().map(|line| format!("  {line}")));
        }

        if !self.fields.is_empty() {
            out.push(String::new());
            let width = self.fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, value) in &self.fields {
                out.push(format!("  {key:<width$}  {value}"));
            }
        }

        out.extend(self.warnings.iter().map(|w| format!("warning: {w}")));
        out.extend(self.suggestions.iter().map(|s| format!("try: {s}")));
        out.join("\n")
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.suggestions.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", human.render());
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            retryable: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                retryable: err.is_retryable(),
                details: err.details(),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    match err {
        Error::Validation(errors) => {
            eprintln!("error: validation failed");
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
        }
        _ => {
            eprintln!("error: {err}");
            if let Some(cause) = std::error::Error::source(err) {
                eprintln!("  caused by: {}", cause_chain(cause));
            }
        }
    }
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

/// Command name (with subcommand for `category`) from raw arguments
pub fn command_name_from<I>(args: I) -> String
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    // global flags that consume the following argument
    const VALUE_FLAGS: [&str; 2] = ["--config", "--data-dir"];

    let mut args = args.into_iter().map(Into::into);
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        positional.push(arg);
        let wants_sub = positional.len() == 1 && positional[0] == "category";
        if !wants_sub {
            break;
        }
    }

    match positional.len() {
        0 => "taskboard".to_string(),
        _ => positional.join(" "),
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound { kind: "Task", .. } => vec!["taskboard list".to_string()],
        Error::NotFound { .. } => vec!["taskboard category list".to_string()],
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["fix .taskboard.toml then retry".to_string()]
        }
        Error::Backend { source: Some(_), .. } => {
            vec!["check the data directory, then retry the command".to_string()]
        }
        Error::Backend { .. } | Error::LockFailed(_) => vec!["retry the command".to_string()],
        _ => Vec::new(),
    }
}
