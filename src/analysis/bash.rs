//! Bash tool analysis.

use super::context::AnalyzeOptions;
use super::trace::{Recorder, TraceStep};
use crate::decision::{BlockInfo, Decision};
use crate::input::BashInput;
use crate::rules::{
    RuleContext, check_custom_rules, dangerous_in_text, dispatch, too_deep, unparseable,
};
use crate::shell::{
    EffectiveCommand, MAX_WRAPPER_DEPTH, Resolution, is_unterminated, parse_command_line, resolve,
};

/// Analyze a Bash tool invocation.
pub fn analyze_bash(input: &BashInput, opts: &AnalyzeOptions) -> Decision {
    analyze_command(&input.command, opts)
}

/// Analyze a full command line. The first blocked simple command wins.
pub fn analyze_command(command: &str, opts: &AnalyzeOptions) -> Decision {
    analyze_with(command, opts, &Recorder::off())
}

/// Like [`analyze_command`], also returning every step taken.
pub fn analyze_command_traced(command: &str, opts: &AnalyzeOptions) -> (Decision, Vec<TraceStep>) {
    let recorder = Recorder::on();
    let decision = analyze_with(command, opts, &recorder);
    (decision, recorder.into_steps())
}

fn analyze_with(command: &str, opts: &AnalyzeOptions, recorder: &Recorder) -> Decision {
    let unterminated = is_unterminated(command);
    if unterminated && opts.env.strict {
        log::debug!("strict mode: unterminated input");
        recorder.record(|| TraceStep::StrictUnparseable);
        return with_segment(unparseable(), command.trim());
    }

    let walk = Walk { opts, recorder };
    let decision = walk.at_depth(command, opts.rule_context(), &[], 0);
    if decision.is_blocked() || !unterminated {
        return decision;
    }

    // The words after an unterminated quote are a guess; scan the raw text too.
    let text = walk.scan_text(command, 0);
    with_segment(text, command.trim())
}

fn with_segment(decision: Decision, segment: &str) -> Decision {
    match decision {
        Decision::Block(info) => Decision::Block(attach_segment(info, segment.to_string())),
        Decision::Allow => Decision::Allow,
    }
}

/// Builtins after which relative paths no longer resolve against the known cwd.
const CWD_CHANGERS: &[&str] = &["cd", "pushd", "popd"];

struct Walk<'a> {
    opts: &'a AnalyzeOptions,
    recorder: &'a Recorder,
}

impl Walk<'_> {
    /// `inherited` holds assignments made outside an inline shell script
    /// (`TMPDIR=/x sh -c '...'`); they still apply to the script's commands.
    fn at_depth(
        &self,
        command: &str,
        base: RuleContext<'_>,
        inherited: &[(String, String)],
        depth: usize,
    ) -> Decision {
        if depth > MAX_WRAPPER_DEPTH {
            log::debug!("nesting depth {depth} exceeded");
            self.recorder.record(|| TraceStep::TooDeep { depth });
            return too_deep();
        }

        let line = parse_command_line(command);
        log::trace!("depth {depth}: {} simple commands", line.len());
        self.recorder.record(|| TraceStep::Parse {
            depth,
            segments: line.iter().map(|s| s.text()).collect(),
        });

        let mut cwd = base.cwd;
        for (index, simple) in line.iter().enumerate() {
            let scope = RuleContext {
                cwd,
                nested: None,
                ..base
            };
            let nested = |script: &str| self.at_depth(script, scope, &[], depth + 1);
            let ctx = RuleContext {
                nested: Some(&nested),
                ..scope
            };

            for body in simple.substitutions() {
                let decision = self.at_depth(body, scope, &[], depth + 1);
                if decision.is_blocked() {
                    return decision;
                }
            }

            let args = simple.args();
            let mut program = None;
            let mut wrappers = Vec::new();
            let (resolved, decision) = if let [only] = args.as_slice()
                && only.contains(char::is_whitespace)
            {
                ("text", self.scan_text(only, depth))
            } else {
                match resolve(&args) {
                    Resolution::Empty => ("empty", Decision::allow()),
                    Resolution::TooDeep => ("too-deep", too_deep()),
                    Resolution::Shell {
                        shell,
                        script,
                        assignments,
                    } => {
                        log::debug!("descending into {shell} at depth {}", depth + 1);
                        program = Some(shell);
                        let mut assigned = inherited.to_vec();
                        assigned.extend(assignments);
                        ("shell", self.at_depth(&script, scope, &assigned, depth + 1))
                    }
                    Resolution::Command(mut effective) => {
                        if !inherited.is_empty() {
                            let own = std::mem::take(&mut effective.assignments);
                            effective.assignments = inherited.iter().cloned().chain(own).collect();
                        }
                        let name = effective.name();
                        if CWD_CHANGERS.contains(&name.as_str()) {
                            log::debug!("cwd unknown after {name}");
                            self.recorder.record(|| TraceStep::CwdChange {
                                depth,
                                segment: simple.text(),
                            });
                            cwd = None;
                        }
                        let decision = self.check_effective(&effective, &ctx);
                        program = Some(name);
                        wrappers = effective.wrappers;
                        ("command", decision)
                    }
                }
            };

            self.recorder.record(|| TraceStep::Segment {
                depth,
                index,
                segment: simple.text(),
                resolved,
                program,
                wrappers,
                rule: decision.block_info().map(|i| i.rule.clone()),
            });

            if let Decision::Block(info) = decision {
                return Decision::Block(attach_segment(info, simple.text()));
            }
        }

        Decision::allow()
    }

    /// Built-in analyzers first, then user rules.
    fn check_effective(&self, cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
        let decision = dispatch(cmd, ctx);
        if decision.is_blocked() {
            return decision;
        }
        check_custom_rules(cmd, &self.opts.overrides)
    }

    fn scan_text(&self, text: &str, depth: usize) -> Decision {
        let decision = dangerous_in_text(text);
        self.recorder.record(|| TraceStep::DangerousText {
            depth,
            text: text.to_string(),
            rule: decision.block_info().map(|i| i.rule.clone()),
        });
        decision
    }
}

/// Keep the innermost segment when a block bubbles out of nested scripts.
fn attach_segment(info: BlockInfo, segment: String) -> BlockInfo {
    if info.segment.is_some() {
        info
    } else {
        info.with_segment(segment)
    }
}
