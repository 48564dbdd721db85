use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::MAIN_SEPARATOR;

use glob::{glob_with, MatchOptions, Pattern};

use crate::context::CompletionContext;
use crate::error::CompletionError;
use crate::tree::{Callback, PathKind, ValueCompleter};

/// A value offered to the shell with an optional description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub help: Option<String>,
}

impl Candidate {
    pub fn new(value: &str) -> Candidate {
        Candidate {
            value: value.to_owned(),
            help: None,
        }
    }

    pub fn with_help(value: &str, help: &str) -> Candidate {
        Candidate {
            value: value.to_owned(),
            help: Some(help.to_owned()),
        }
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Candidate {
        Candidate::new(value)
    }
}

impl From<(&str, &str)> for Candidate {
    fn from((value, help): (&str, &str)) -> Candidate {
        Candidate::with_help(value, help)
    }
}

/// Produces the candidates for `ctx`, in the order the providers yield them.
/// Every returned value starts with `ctx.incomplete`.
pub fn complete(ctx: &CompletionContext) -> Vec<Candidate> {
    let param = match ctx.active_parameter {
        Some(param) => param,
        None => return names(ctx),
    };

    let incomplete = ctx.incomplete.as_str();
    let candidates = match &param.completer {
        ValueCompleter::None => Vec::new(),
        ValueCompleter::StaticChoices(choices) => choices.clone(),
        ValueCompleter::Path(kind) => paths(incomplete, *kind),
        ValueCompleter::Callback(callback) => match run_callback(callback, ctx, &param.name) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!("{}", err);
                Vec::new()
            }
        },
    };

    filter_by_prefix(candidates, incomplete)
}

fn filter_by_prefix(candidates: Vec<Candidate>, incomplete: &str) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.value.starts_with(incomplete))
        .collect()
}

/// Option flags (when wanted) followed by the subcommands of the resolved
/// command.
fn names(ctx: &CompletionContext) -> Vec<Candidate> {
    let node = ctx.node();
    let mut candidates = Vec::new();

    if ctx.offers_flags() {
        for (index, param) in node.params.iter().enumerate() {
            if !param.is_option() || param.hidden {
                continue;
            }

            if ctx.is_supplied(index) && !param.allow_multiple {
                continue;
            }

            for flag in &param.flags {
                candidates.push(Candidate {
                    value: flag.clone(),
                    help: param.help.clone(),
                });
            }

            // No help here: shells like fish would group them with the
            // primary flags.
            for flag in &param.secondary_flags {
                candidates.push(Candidate::new(flag));
            }
        }
    }

    for (_, child) in &node.subcommands {
        let sub = ctx.tree().node(*child);
        if !sub.hidden {
            candidates.push(Candidate {
                value: sub.name.clone(),
                help: sub.help.clone(),
            });
        }
    }

    filter_by_prefix(candidates, &ctx.incomplete)
}

/// Runs an application-supplied provider. Errors and panics are turned into
/// `CompletionError::CompletionProvider`.
pub fn run_callback(
    callback: &Callback,
    ctx: &CompletionContext,
    param_name: &str,
) -> Result<Vec<Candidate>, CompletionError> {
    let result = catch_unwind(AssertUnwindSafe(|| callback.call(ctx, &ctx.incomplete)));
    match result {
        Ok(Ok(candidates)) => Ok(candidates),
        Ok(Err(err)) => Err(CompletionError::CompletionProvider {
            param: param_name.to_owned(),
            reason: err.to_string(),
        }),
        Err(_) => Err(CompletionError::CompletionProvider {
            param: param_name.to_owned(),
            reason: "the provider panicked".to_owned(),
        }),
    }
}

/// Lists the filesystem entries matching `incomplete`. The directory part of
/// `incomplete` picks the directory to list and is kept in the returned
/// values; the rest filters the entries. Directories end with a separator.
pub fn paths(incomplete: &str, kind: PathKind) -> Vec<Candidate> {
    let (dir, rest) = match incomplete.rfind(MAIN_SEPARATOR) {
        Some(index) => incomplete.split_at(index + 1),
        None => ("", incomplete),
    };

    let pattern = format!("{}{}*", Pattern::escape(dir), Pattern::escape(rest));
    trace!("path_completion: current='{}', pattern='{}'", incomplete, pattern);

    // Dotfiles only show up once the user typed the dot.
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = match glob_with(&pattern, options) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("path_completion: invalid pattern '{}': {}", pattern, err);
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                debug!("path_completion: {}", err);
                continue;
            }
        };

        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };

        let is_dir = path.is_dir();
        let wanted = match kind {
            PathKind::FileOnly => !is_dir,
            PathKind::DirOnly => is_dir,
            PathKind::Any => true,
        };

        if !wanted {
            continue;
        }

        let mut value = format!("{}{}", dir, name);
        if is_dir {
            value.push(MAIN_SEPARATOR);
        }

        candidates.push(Candidate { value, help: None });
    }

    candidates
}
