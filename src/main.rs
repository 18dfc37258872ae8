//! cc-safety-net - agent CLI security hook entry point.

use cc_safety_net::analysis::{
    AnalyzeOptions, Environment, analyze_command, analyze_command_traced,
};
use cc_safety_net::audit::record_block;
use cc_safety_net::config::{load_overrides, verify};
use cc_safety_net::decision::{BlockInfo, Decision};
use cc_safety_net::input::{HookFormat, ShellRequest};
use cc_safety_net::output::{
    format_blocked_message, format_config_report, format_deny_json, format_explanation,
    format_explanation_json, format_response,
};
use cc_safety_net::shell::join_quoted;

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Blocks destructive git and rm commands before they run.
#[derive(Parser)]
#[command(name = "cc-safety-net", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read a pre-tool hook payload from stdin (default)
    Hook {
        /// Hook protocol of the calling agent CLI
        #[arg(long, value_enum, default_value_t = HookFormat::ClaudeCode)]
        format: HookFormat,
    },
    /// Validate user and project config files
    VerifyConfig,
    /// Show the verdict for a command without running it
    Explain {
        /// Working directory to analyze against (defaults to the current one)
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Print the verdict and every analysis step as JSON
        #[arg(long)]
        json: bool,
        /// The command line, as one argument or as separate words
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("SAFETY_NET_LOG", "off"))
        .target(env_logger::Target::Stderr)
        .init();
}

fn current_dir() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

/// Report a block in the format's own way.
fn deny(format: HookFormat, message: &str) -> ExitCode {
    match format_deny_json(format, message) {
        Some(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
    }
}

fn run_hook(format: HookFormat) -> ExitCode {
    let env = Environment::from_process();

    let mut json = String::new();
    if let Err(e) = io::stdin().lock().read_to_string(&mut json) {
        log::debug!("ignoring unreadable hook input: {e}");
        return ExitCode::SUCCESS;
    }
    if json.trim().is_empty() {
        return ExitCode::SUCCESS;
    }

    // Fail open on malformed input unless strict
    let request = match format.parse_request(&json) {
        Ok(Some(request)) => request,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("ignoring hook input: {e}");
            if !env.strict {
                return ExitCode::SUCCESS;
            }
            let info = BlockInfo::new("strict.invalid_input", e.strict_reason());
            return deny(format, &format_blocked_message(&info, ""));
        }
    };

    let ShellRequest {
        command,
        cwd,
        session_id,
    } = request;
    let overrides = load_overrides(cwd.as_deref().map(Path::new));
    let home = env.home.clone();
    let opts = AnalyzeOptions::new(cwd, env, overrides);

    let decision = analyze_command(&command, &opts);
    let Decision::Block(info) = &decision else {
        return ExitCode::SUCCESS;
    };

    if let (Some(session_id), Some(home)) = (&session_id, &home) {
        record_block(Path::new(home), session_id, &command, info, opts.cwd.as_deref());
    }

    match format_response(&decision, &command) {
        Some(msg) => deny(format, &msg),
        None => ExitCode::SUCCESS,
    }
}

fn run_verify_config() -> ExitCode {
    let cwd = current_dir();
    let reports = verify(cwd.as_deref());
    let (text, failed) = format_config_report(&reports);
    if failed {
        eprintln!("{}", text);
        ExitCode::from(1)
    } else {
        println!("{}", text);
        ExitCode::SUCCESS
    }
}

fn run_explain(cwd: Option<PathBuf>, json: bool, words: &[String]) -> ExitCode {
    let command = match words {
        [single] => single.clone(),
        _ => join_quoted(words),
    };
    let cwd = cwd.or_else(current_dir);
    let overrides = load_overrides(cwd.as_deref());
    let opts = AnalyzeOptions::new(
        cwd.map(|p| p.to_string_lossy().into_owned()),
        Environment::from_process(),
        overrides,
    );

    if json {
        let (decision, steps) = analyze_command_traced(&command, &opts);
        println!("{}", format_explanation_json(&command, &decision, &steps));
    } else {
        let decision = analyze_command(&command, &opts);
        println!("{}", format_explanation(&decision));
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        None => run_hook(HookFormat::default()),
        Some(Command::Hook { format }) => run_hook(format),
        Some(Command::VerifyConfig) => run_verify_config(),
        Some(Command::Explain { cwd, json, command }) => run_explain(cwd, json, &command),
    }
}
