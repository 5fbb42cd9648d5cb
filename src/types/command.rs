//! Conversion commands and the requests built from them

use std::fmt;
use std::str::FromStr;

use lsp_types::{ExecuteCommandParams, WorkDoneProgressParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ConnectorError;

/// A conversion the server knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvertCommand {
    /// Convert the document to HTML
    #[serde(rename = "convert.toHtml")]
    ToHtml,
    /// Convert the document to Markdown
    #[serde(rename = "convert.toMarkdown")]
    ToMarkdown,
}

impl ConvertCommand {
    /// Every supported command, in menu order
    pub const ALL: [ConvertCommand; 2] = [ConvertCommand::ToHtml, ConvertCommand::ToMarkdown];

    /// Server-side command identifier
    pub fn id(self) -> &'static str {
        match self {
            ConvertCommand::ToHtml => "convert.toHtml",
            ConvertCommand::ToMarkdown => "convert.toMarkdown",
        }
    }

    /// Caption shown in the editor's command palette
    pub fn title(self) -> &'static str {
        match self {
            ConvertCommand::ToHtml => "Convert To HTML",
            ConvertCommand::ToMarkdown => "Convert To Markdown",
        }
    }

    /// Name the editor invokes the command by
    pub fn editor_name(self) -> &'static str {
        match self {
            ConvertCommand::ToHtml => "convert_to_html",
            ConvertCommand::ToMarkdown => "convert_to_markdown",
        }
    }
}

impl fmt::Display for ConvertCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ConvertCommand {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convert.toHtml" | "convert_to_html" | "html" => Ok(ConvertCommand::ToHtml),
            "convert.toMarkdown" | "convert_to_markdown" | "markdown" | "md" => {
                Ok(ConvertCommand::ToMarkdown)
            }
            other => Err(ConnectorError::UnknownCommand(other.to_string())),
        }
    }
}

/// A single `workspace/executeCommand` payload
///
/// Built fresh for each invocation. The argument list always holds exactly
/// the document locator, which is the empty string for documents without a
/// backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    command: ConvertCommand,
    locator: String,
}

impl CommandRequest {
    /// Create a request for `command` applied to `locator`
    pub fn new(command: ConvertCommand, locator: impl Into<String>) -> Self {
        Self {
            command,
            locator: locator.into(),
        }
    }

    /// The command this request executes
    pub fn command(&self) -> ConvertCommand {
        self.command
    }

    /// The document locator passed as the sole argument
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Convert into the LSP parameter type
    pub fn into_params(self) -> ExecuteCommandParams {
        ExecuteCommandParams {
            command: self.command.id().to_string(),
            arguments: vec![Value::String(self.locator)],
            work_done_progress_params: WorkDoneProgressParams::default(),
        }
    }
}

/// Reply shape of the reference conversion server
///
/// The fire-and-forget path never looks at replies; hosts that surface the
/// result can deserialize it into this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Converted document text
    pub content: String,
    /// Target format name as reported by the server
    #[serde(default)]
    pub format: Option<String>,
    /// Non-fatal conversion warnings
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ConversionOutput {
    /// Interpret a raw `executeCommand` result, if it has the expected shape
    pub fn from_result(result: &Value) -> Option<Self> {
        serde_json::from_value(result.clone()).ok()
    }
}
