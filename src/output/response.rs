//! Response formatting for hook output.

use super::redaction::{redact_json, redact_secrets, truncate};
use crate::analysis::TraceStep;
use crate::decision::{BlockInfo, Decision};
use crate::input::HookFormat;
use serde_json::json;

const EXCERPT_LENGTH: usize = 200;
const CLOSING: &str =
    "If this operation is truly needed, ask the user for explicit permission and have them run the command manually.";

fn excerpt(text: &str) -> String {
    truncate(&redact_secrets(text), EXCERPT_LENGTH)
}

/// Format the stderr message for a blocked command.
pub fn format_blocked_message(info: &BlockInfo, command: &str) -> String {
    let mut msg = format!("BLOCKED by Safety Net\n\nReason: {}", info.reason);
    if !command.trim().is_empty() {
        msg.push_str(&format!("\n\nCommand: {}", excerpt(command)));
    }
    if let Some(segment) = &info.segment
        && segment.trim() != command.trim()
    {
        msg.push_str(&format!("\n\nSegment: {}", excerpt(segment)));
    }
    msg.push_str("\n\n");
    msg.push_str(CLOSING);
    msg
}

/// Format a decision as output for stderr. `None` when allowed.
pub fn format_response(decision: &Decision, command: &str) -> Option<String> {
    decision
        .block_info()
        .map(|info| format_blocked_message(info, command))
}

/// stdout JSON denying the tool call. `None` for formats that report blocks
/// on stderr with an exit code instead.
pub fn format_deny_json(format: HookFormat, message: &str) -> Option<String> {
    let value = match format {
        HookFormat::ClaudeCode => return None,
        HookFormat::GeminiCli => json!({
            "decision": "deny",
            "reason": message,
            "systemMessage": message,
        }),
        HookFormat::CopilotCli => json!({
            "permissionDecision": "deny",
            "permissionDecisionReason": message,
        }),
    };
    Some(value.to_string())
}

/// Human-readable verdict for the `explain` subcommand.
pub fn format_explanation(decision: &Decision) -> String {
    match decision {
        Decision::Allow => "ALLOWED".to_string(),
        Decision::Block(info) => {
            let mut out = format!("BLOCKED\n  Rule:    {}\n  Reason:  {}", info.rule, info.reason);
            if let Some(segment) = &info.segment {
                out.push_str(&format!("\n  Segment: {}", excerpt(segment)));
            }
            out
        }
    }
}

/// `explain --json` output: the verdict plus every analysis step, with
/// secrets redacted from all strings.
pub fn format_explanation_json(command: &str, decision: &Decision, steps: &[TraceStep]) -> String {
    let verdict = if decision.is_blocked() { "block" } else { "allow" };
    let mut value = json!({
        "command": command,
        "decision": verdict,
        "block": decision.block_info(),
        "trace": steps,
    });
    redact_json(&mut value);
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
