//! Output formatting and response generation.

mod redaction;
mod report;
mod response;

pub use redaction::{redact_json, redact_secrets, truncate};
pub use report::format_config_report;
pub use response::{
    format_blocked_message, format_deny_json, format_explanation, format_explanation_json,
    format_response,
};
