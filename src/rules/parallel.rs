//! GNU parallel command analysis.

use super::rm::{analyze_rm, is_recursive_force};
use super::{RuleContext, dispatch, too_deep};
use crate::decision::Decision;
use crate::shell::{EffectiveCommand, Resolution, is_shell, resolve};

const REASON_PARALLEL_RM: &str =
    "parallel rm -rf with dynamic input is dangerous. Use explicit file list instead.";
const REASON_PARALLEL_SHELL: &str =
    "parallel with shell -c can execute arbitrary commands from dynamic input.";

/// parallel options whose value is the next word.
const VALUE_OPTIONS: &[&str] = &[
    "-S", "--sshlogin", "--slf", "--sshloginfile", "-a", "--arg-file", "--colsep", "-I",
    "--replace", "--results", "--result", "--res", "-j", "--jobs",
];

const INPUT_MARKER: &str = ":::";
const PLACEHOLDERS: &[&str] = &["{}", "{1}", "{.}"];

/// A parallel invocation split into its command template and `:::` inputs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParallelJob {
    pub template: Vec<String>,
    pub inputs: Vec<String>,
}

impl ParallelJob {
    pub fn has_placeholder(&self) -> bool {
        self.template
            .iter()
            .any(|w| PLACEHOLDERS.iter().any(|p| w.contains(p)))
    }

    fn expanded(&self, words: &[String], input: &str) -> Vec<String> {
        words.iter().map(|w| w.replace("{}", input)).collect()
    }
}

/// Split parallel arguments. `None` when there is neither a template nor
/// an input list.
pub fn parse_job(args: &[String]) -> Option<ParallelJob> {
    let mut idx = 0;
    while let Some(word) = args.get(idx) {
        if word == INPUT_MARKER {
            break;
        }
        if word == "--" {
            idx += 1;
            break;
        }
        if !word.starts_with('-') {
            break;
        }
        idx += if VALUE_OPTIONS.contains(&word.as_str()) { 2 } else { 1 };
    }

    let rest = args.get(idx..).unwrap_or_default();
    let marker = rest.iter().position(|w| w == INPUT_MARKER);
    let template = rest[..marker.unwrap_or(rest.len())].to_vec();
    let inputs: Vec<String> = marker
        .map(|m| rest[m + 1..].iter().filter(|w| *w != INPUT_MARKER).cloned().collect())
        .unwrap_or_default();

    if template.is_empty() && marker.is_none() {
        return None;
    }
    Some(ParallelJob { template, inputs })
}

fn first_blocked(mut decisions: impl Iterator<Item = Decision>) -> Decision {
    decisions.find(Decision::is_blocked).unwrap_or(Decision::Allow)
}

fn analyze_shell_script(job: &ParallelJob, script: &str, ctx: &RuleContext<'_>) -> Decision {
    // The input itself is the script.
    if script == "{}" || script == "{1}" {
        return Decision::block("parallel.shell", REASON_PARALLEL_SHELL);
    }
    if script.contains("{}") && !job.inputs.is_empty() {
        return first_blocked(
            job.inputs
                .iter()
                .map(|input| ctx.analyze_nested(&script.replace("{}", input))),
        );
    }
    let decision = ctx.analyze_nested(script);
    if decision.is_blocked() || script.contains("{}") {
        return decision;
    }
    if job.has_placeholder() {
        return Decision::block("parallel.shell", REASON_PARALLEL_SHELL);
    }
    Decision::allow()
}

fn analyze_rm_template(
    job: &ParallelJob,
    rm: &EffectiveCommand,
    ctx: &RuleContext<'_>,
) -> Decision {
    if job.inputs.is_empty() {
        return Decision::block("parallel.rm_rf", REASON_PARALLEL_RM);
    }
    let placeholder = job.has_placeholder();
    first_blocked(job.inputs.iter().map(|input| {
        let args = if placeholder {
            job.expanded(&rm.args, input)
        } else {
            let mut args = rm.args.clone();
            args.push(input.clone());
            args
        };
        let expanded = EffectiveCommand {
            args,
            ..rm.clone()
        };
        analyze_rm(&expanded, ctx)
    }))
}

/// Analyze parallel by expanding its template with the known inputs.
pub fn analyze_parallel(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    let Some(job) = parse_job(&cmd.args) else {
        return Decision::allow();
    };

    // `parallel ::: 'cmd1' 'cmd2'` runs each input as a command.
    if job.template.is_empty() {
        return first_blocked(job.inputs.iter().map(|input| ctx.analyze_nested(input)));
    }

    match resolve(&job.template) {
        Resolution::Shell { script, .. } => analyze_shell_script(&job, &script, ctx),
        Resolution::Command(child) if is_shell(&child.name()) => {
            if !job.inputs.is_empty() || job.has_placeholder() {
                Decision::block("parallel.shell", REASON_PARALLEL_SHELL)
            } else {
                Decision::allow()
            }
        }
        Resolution::Command(child) if child.name() == "rm" && is_recursive_force(&child.args) => {
            analyze_rm_template(&job, &child, ctx)
        }
        Resolution::Command(child) => dispatch(&child, ctx),
        Resolution::TooDeep => too_deep(),
        Resolution::Empty => Decision::allow(),
    }
}
