//! Figures out where the cursor is in a partially typed command line: which
//! (sub)command is being run and which parameter the fragment under the
//! cursor belongs to.
use crate::config::Config;
use crate::error::{CompletionError, Result};
use crate::tree::{CommandNode, CommandTree, NodeId, Param};

/// What the fragment under the cursor is filling. Rebuilt for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionContext<'a> {
    tree: &'a CommandTree,
    /// Commands from the root down to the resolved one.
    pub command_path: Vec<NodeId>,
    /// Fully typed tokens which belong to the resolved command.
    pub consumed_args: Vec<String>,
    /// The token being completed. Possibly empty.
    pub incomplete: String,
    /// `None` means "offer subcommands and option flags".
    pub active_parameter: Option<&'a Param>,
    // Indices into the resolved command's params.
    supplied: Vec<usize>,
    offer_flags: bool,
}

impl<'a> CompletionContext<'a> {
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    /// The resolved command.
    pub fn command(&self) -> NodeId {
        // `command_path` always starts with the root.
        self.command_path[self.command_path.len() - 1]
    }

    pub fn node(&self) -> &'a CommandNode {
        self.tree.node(self.command())
    }

    /// Names of the commands in `command_path`.
    pub fn command_names(&self) -> Vec<&'a str> {
        self.tree.path(self.command())
    }

    /// Returns true if the `index`-th parameter of the resolved command
    /// appeared in `consumed_args`.
    pub fn is_supplied(&self, index: usize) -> bool {
        self.supplied.contains(&index)
    }

    /// Whether flag names should be offered alongside subcommands.
    pub fn offers_flags(&self) -> bool {
        self.offer_flags
    }
}

/// The state left behind by re-playing the typed tokens of a command.
#[derive(Debug, Default, PartialEq)]
struct Replay {
    supplied: Vec<usize>,
    /// An option still waiting for its value.
    pending: Option<usize>,
    options_ended: bool,
    /// The first argument with free positional slots.
    open_argument: Option<usize>,
}

fn replay(params: &[Param], tokens: &[String]) -> Replay {
    let arguments: Vec<usize> = params
        .iter()
        .enumerate()
        .filter(|(_, param)| param.is_argument())
        .map(|(index, _)| index)
        .collect();
    let is_full = |arg: usize, filled: usize| match params[arg].capacity() {
        Some(capacity) => filled >= capacity,
        None => false,
    };

    let mut state = Replay::default();
    let mut filled = vec![0; arguments.len()];
    let mut next_arg = 0;
    let mut pending: Option<(usize, usize)> = None;
    for token in tokens {
        // Whatever follows an option which expects a value is the value,
        // even if it looks like a flag.
        if let Some((index, left)) = pending {
            pending = if left > 1 { Some((index, left - 1)) } else { None };
            continue;
        }

        if !state.options_ended {
            if token == "--" {
                state.options_ended = true;
                continue;
            }

            if let Some(index) = params.iter().position(|param| param.matches_flag(token)) {
                if !state.supplied.contains(&index) {
                    state.supplied.push(index);
                }

                // Secondary flags (`--no-foo`) never take a value.
                let param = &params[index];
                if param.flags.iter().any(|flag| flag == token) && param.values_per_occurrence() > 0 {
                    pending = Some((index, param.values_per_occurrence()));
                }

                continue;
            }
        }

        while next_arg < arguments.len() && is_full(arguments[next_arg], filled[next_arg]) {
            next_arg += 1;
        }

        match filled.get_mut(next_arg) {
            Some(count) => *count += 1,
            None => trace!("resolve: surplus positional token '{}'", token),
        }
    }

    while next_arg < arguments.len() && is_full(arguments[next_arg], filled[next_arg]) {
        next_arg += 1;
    }

    state.pending = pending.map(|(index, _)| index);
    state.open_argument = arguments.get(next_arg).cloned();
    state
}

/// Resolves `line`: the program name placeholder followed by the typed
/// tokens; the last token is the fragment being completed.
pub fn resolve<'a>(tree: &'a CommandTree, line: &[String], config: &Config) -> Result<CompletionContext<'a>> {
    let args = match line.split_first() {
        Some((_, args)) => args,
        None => {
            return Err(CompletionError::MalformedInvocation(
                "the command line does not include the program name".to_owned(),
            ))
        }
    };

    let (incomplete, typed) = match args.split_last() {
        Some((last, typed)) => (last.clone(), typed),
        None => (String::new(), args),
    };

    // Descend while the typed tokens name subcommands.
    let mut command = tree.root();
    let mut command_path = vec![command];
    let mut descended = 0;
    for token in typed {
        match tree.lookup_subcommand(command, token) {
            Some(child) => {
                command = child;
                command_path.push(child);
                descended += 1;
            }
            None => break,
        }
    }

    let consumed_args = typed[descended..].to_vec();
    let params = tree.params(command);
    let state = replay(params, &consumed_args);

    let active_parameter = if let Some(index) = state.pending {
        Some(&params[index])
    } else if !state.options_ended && config.is_flag_like(&incomplete) {
        None
    } else {
        state.open_argument.map(|index| &params[index])
    };

    let offer_flags = active_parameter.is_none()
        && !state.options_ended
        && (config.complete_options || config.is_flag_like(&incomplete));

    trace!(
        "resolve: command={:?}, consumed={:?}, incomplete='{}', active={:?}",
        tree.path(command),
        consumed_args,
        incomplete,
        active_parameter.map(|param| param.name.as_str())
    );

    Ok(CompletionContext {
        tree,
        command_path,
        consumed_args,
        incomplete,
        active_parameter,
        supplied: state.supplied,
        offer_flags,
    })
}
