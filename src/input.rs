//! Hook payloads read from stdin, one shape per agent CLI.

use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use thiserror::Error;

/// The only tool this hook inspects.
pub const BASH_TOOL: &str = "Bash";

const GEMINI_EVENT: &str = "BeforeTool";
const GEMINI_SHELL_TOOL: &str = "run_shell_command";
const COPILOT_SHELL_TOOL: &str = "bash";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid hook payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid toolArgs: {0}")]
    ToolArgs(serde_json::Error),

    #[error("failed to read hook payload: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    /// Block reason used when strict mode refuses a malformed payload.
    pub fn strict_reason(&self) -> &'static str {
        match self {
            InputError::ToolArgs(_) => "Failed to parse toolArgs JSON (strict mode)",
            _ => "Failed to parse hook input JSON (strict mode)",
        }
    }
}

/// Hook protocol spoken on stdin and stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HookFormat {
    /// `PreToolUse` payload; blocks go to stderr with exit code 2.
    #[default]
    ClaudeCode,
    /// `BeforeTool` payload; blocks are a JSON deny on stdout.
    GeminiCli,
    /// `preToolUse` payload with JSON-encoded `toolArgs`; blocks are a JSON
    /// deny on stdout.
    CopilotCli,
}

/// A shell command an agent is about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    pub command: String,
    pub cwd: Option<String>,
    /// Names the audit log file.
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiInput {
    #[serde(default)]
    hook_event_name: String,
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: Value,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CopilotInput {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_args: String,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CommandArgs {
    #[serde(default)]
    command: Option<String>,
}

impl HookFormat {
    /// Extract the shell command from a payload. `Ok(None)` when the payload
    /// is for another tool or event, or carries no command.
    pub fn parse_request(self, json: &str) -> Result<Option<ShellRequest>, InputError> {
        match self {
            HookFormat::ClaudeCode => {
                let input = HookInput::parse(json)?;
                Ok(input.as_bash().map(|bash| ShellRequest {
                    command: bash.command,
                    cwd: input.cwd,
                    session_id: input.session_id,
                }))
            }
            HookFormat::GeminiCli => {
                let input: GeminiInput = serde_json::from_str(json)?;
                if input.hook_event_name != GEMINI_EVENT || input.tool_name != GEMINI_SHELL_TOOL {
                    return Ok(None);
                }
                let command = input.tool_input.get("command").and_then(Value::as_str);
                Ok(non_empty(command).map(|command| ShellRequest {
                    command,
                    cwd: input.cwd,
                    session_id: input.session_id,
                }))
            }
            HookFormat::CopilotCli => {
                let input: CopilotInput = serde_json::from_str(json)?;
                if input.tool_name != COPILOT_SHELL_TOOL {
                    return Ok(None);
                }
                let args: CommandArgs =
                    serde_json::from_str(&input.tool_args).map_err(InputError::ToolArgs)?;
                let session_id = input.timestamp.map(|ts| match ts {
                    Value::String(s) => format!("copilot-{s}"),
                    other => format!("copilot-{other}"),
                });
                Ok(non_empty(args.command.as_deref()).map(|command| ShellRequest {
                    command,
                    cwd: input.cwd,
                    session_id,
                }))
            }
        }
    }
}

fn non_empty(command: Option<&str>) -> Option<String> {
    command.filter(|c| !c.is_empty()).map(String::from)
}

/// Hook payload. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    pub tool_name: String,

    /// Tool parameters; shape depends on `tool_name`.
    #[serde(default)]
    pub tool_input: serde_json::Value,

    #[serde(default)]
    pub cwd: Option<String>,

    /// Names the audit log file.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `tool_input` of a Bash call.
#[derive(Debug, Clone, Deserialize)]
pub struct BashInput {
    pub command: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl HookInput {
    pub fn parse(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse the whole payload.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, InputError> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Self::parse(&json)
    }

    /// `None` for other tools, or a Bash call without a string `command`.
    pub fn as_bash(&self) -> Option<BashInput> {
        if self.tool_name != BASH_TOOL {
            return None;
        }
        BashInput::deserialize(&self.tool_input).ok()
    }

    pub fn command(&self) -> Option<&str> {
        self.tool_input.get("command")?.as_str()
    }
}
