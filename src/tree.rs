//! The command tree: commands, subcommands and their parameters.
//!
//! Hosts declare their CLI with the [`Command`] and [`Param`] builders and
//! freeze it into a [`CommandTree`]. The tree is read-only afterwards; nodes
//! live in a flat arena and refer to their parent by index, so the back
//! reference is only good for rebuilding a command path.
use std::fmt;
use std::sync::Arc;

use crate::completion::Candidate;
use crate::context::CompletionContext;
use crate::error::{CompletionError, Result};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Option,
    Argument,
}

/// How many tokens a parameter consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    ZeroOrOne,
    /// Consumes everything that is left.
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    FileOnly,
    DirOnly,
    Any,
}

/// The signature of an application-supplied completion function.
pub type CompletionFn = dyn Fn(&CompletionContext<'_>, &str) -> std::result::Result<Vec<Candidate>, failure::Error>
    + Send
    + Sync;

#[derive(Clone)]
pub struct Callback(Arc<CompletionFn>);

impl Callback {
    pub fn new<F>(func: F) -> Callback
    where
        F: Fn(&CompletionContext<'_>, &str) -> std::result::Result<Vec<Candidate>, failure::Error>
            + Send
            + Sync
            + 'static,
    {
        Callback(Arc::new(func))
    }

    pub fn call(
        &self,
        ctx: &CompletionContext<'_>,
        incomplete: &str,
    ) -> std::result::Result<Vec<Candidate>, failure::Error> {
        (self.0)(ctx, incomplete)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Where the values of a parameter come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCompleter {
    /// Free text: nothing to offer.
    None,
    StaticChoices(Vec<Candidate>),
    Path(PathKind),
    Callback(Callback),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// `--foo` (long) or `-f` (short). Empty for arguments.
    pub flags: Vec<String>,
    /// Switch-off forms such as `--no-foo`. Offered without help text.
    pub secondary_flags: Vec<String>,
    pub help: Option<String>,
    pub arity: Arity,
    /// False for boolean flags.
    pub takes_value: bool,
    pub allow_multiple: bool,
    pub required: bool,
    pub hidden: bool,
    pub completer: ValueCompleter,
}

impl Param {
    fn new(name: &str, kind: ParamKind, flags: &[&str], takes_value: bool) -> Param {
        Param {
            name: name.to_owned(),
            kind,
            flags: flags.iter().map(|flag| (*flag).to_owned()).collect(),
            secondary_flags: Vec::new(),
            help: None,
            arity: Arity::Exactly(1),
            takes_value,
            allow_multiple: false,
            required: false,
            hidden: false,
            completer: ValueCompleter::None,
        }
    }

    /// An option which takes a value, e.g. `--message <text>`.
    pub fn option(name: &str, flags: &[&str]) -> Param {
        Param::new(name, ParamKind::Option, flags, true)
    }

    /// A boolean option, e.g. `--verbose`.
    pub fn flag(name: &str, flags: &[&str]) -> Param {
        Param::new(name, ParamKind::Option, flags, false)
    }

    /// A positional argument.
    pub fn argument(name: &str) -> Param {
        Param::new(name, ParamKind::Argument, &[], true)
    }

    pub fn help(mut self, help: &str) -> Param {
        self.help = Some(help.to_owned());
        self
    }

    pub fn secondary_flags(mut self, flags: &[&str]) -> Param {
        self.secondary_flags = flags.iter().map(|flag| (*flag).to_owned()).collect();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Param {
        self.arity = arity;
        self
    }

    pub fn multiple(mut self, allow_multiple: bool) -> Param {
        self.allow_multiple = allow_multiple;
        self
    }

    pub fn required(mut self, required: bool) -> Param {
        self.required = required;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Param {
        self.hidden = hidden;
        self
    }

    pub fn choices<I, C>(mut self, choices: I) -> Param
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        self.completer = ValueCompleter::StaticChoices(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn path(mut self, kind: PathKind) -> Param {
        self.completer = ValueCompleter::Path(kind);
        self
    }

    pub fn callback<F>(mut self, func: F) -> Param
    where
        F: Fn(&CompletionContext<'_>, &str) -> std::result::Result<Vec<Candidate>, failure::Error>
            + Send
            + Sync
            + 'static,
    {
        self.completer = ValueCompleter::Callback(Callback::new(func));
        self
    }

    pub fn is_option(&self) -> bool {
        self.kind == ParamKind::Option
    }

    pub fn is_argument(&self) -> bool {
        self.kind == ParamKind::Argument
    }

    /// Returns true if `token` introduces this option.
    pub fn matches_flag(&self, token: &str) -> bool {
        self.is_option()
            && self
                .flags
                .iter()
                .chain(self.secondary_flags.iter())
                .any(|flag| flag == token)
    }

    /// The number of tokens following the flag which belong to the option.
    pub fn values_per_occurrence(&self) -> usize {
        if !self.takes_value {
            return 0;
        }

        match self.arity {
            Arity::Exactly(n) => n,
            Arity::ZeroOrOne | Arity::Unbounded => 1,
        }
    }

    /// The number of positional slots of an argument. `None` is unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self.arity {
            Arity::Exactly(n) => Some(n),
            Arity::ZeroOrOne => Some(1),
            Arity::Unbounded => None,
        }
    }
}

/// A command declaration. Frozen into a [`CommandTree`] by [`CommandTree::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    help: Option<String>,
    hidden: bool,
    params: Vec<Param>,
    subcommands: Vec<Command>,
}

impl Command {
    pub fn new(name: &str) -> Command {
        Command {
            name: name.to_owned(),
            help: None,
            hidden: false,
            params: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    pub fn help(mut self, help: &str) -> Command {
        self.help = Some(help.to_owned());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Command {
        self.hidden = hidden;
        self
    }

    pub fn param(mut self, param: Param) -> Command {
        self.params.push(param);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Command {
        self.subcommands.push(command);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub name: String,
    pub help: Option<String>,
    pub hidden: bool,
    pub parent: Option<NodeId>,
    /// In declaration order.
    pub subcommands: Vec<(String, NodeId)>,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    /// Freezes `root` and its descendants. The root's own name is never
    /// matched against the command line.
    pub fn new(root: Command) -> Result<CommandTree> {
        let mut tree = CommandTree { nodes: Vec::new() };
        tree.insert(root, None)?;
        Ok(tree)
    }

    fn insert(&mut self, command: Command, parent: Option<NodeId>) -> Result<NodeId> {
        for param in &command.params {
            validate_param(&command.name, param)?;
        }

        let id = self.nodes.len();
        self.nodes.push(CommandNode {
            name: command.name,
            help: command.help,
            hidden: command.hidden,
            parent,
            subcommands: Vec::new(),
            params: command.params,
        });

        for sub in command.subcommands {
            if self.lookup_subcommand(id, &sub.name).is_some() {
                return Err(CompletionError::InvalidTree(format!(
                    "duplicate subcommand `{}' in `{}'",
                    sub.name,
                    self.path(id).join(" ")
                )));
            }

            let name = sub.name.clone();
            let child = self.insert(sub, Some(id))?;
            self.nodes[id].subcommands.push((name, child));
        }

        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id]
    }

    pub fn lookup_subcommand(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id]
            .subcommands
            .iter()
            .find(|(sub, _)| sub == name)
            .map(|(_, child)| *child)
    }

    pub fn params(&self, id: NodeId) -> &[Param] {
        &self.nodes[id].params
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Command names from the root down to `id`, the root included.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            names.push(self.nodes[node].name.as_str());
            current = self.nodes[node].parent;
        }

        names.reverse();
        names
    }
}

fn validate_param(command: &str, param: &Param) -> Result<()> {
    match param.kind {
        ParamKind::Option if param.flags.is_empty() => Err(CompletionError::InvalidTree(format!(
            "option `{}' of `{}' has no flags",
            param.name, command
        ))),
        ParamKind::Argument if !param.flags.is_empty() || !param.secondary_flags.is_empty() => {
            Err(CompletionError::InvalidTree(format!(
                "argument `{}' of `{}' must not have flags",
                param.name, command
            )))
        }
        _ if param.arity == Arity::Exactly(0) => Err(CompletionError::InvalidTree(format!(
            "`{}' of `{}' consumes zero tokens",
            param.name, command
        ))),
        _ => Ok(()),
    }
}
