//! Shell completion for programs with nested subcommands.
//!
//! A host program describes its command line as a [`CommandTree`], wraps it
//! in an [`Engine`] and calls [`Engine::serve_and_exit`] first thing in
//! `main`. When the shell invokes the program with `_<PROG>_COMPLETE` set,
//! the engine prints activation code or completion candidates and exits.
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate pest_derive;

#[macro_use]
pub mod macros;

pub mod cmdline;
pub mod codegen;
pub mod completion;
pub mod config;
pub mod context;
pub mod detect;
pub mod engine;
pub mod error;
pub mod install;
pub mod logger;
pub mod paths;
pub mod registry;
pub mod tree;

pub use crate::completion::Candidate;
pub use crate::config::Config;
pub use crate::context::{resolve, CompletionContext};
pub use crate::engine::{CompletionLine, Engine, Instruction, Invocation, Mode};
pub use crate::error::{CompletionError, Result};
pub use crate::registry::ShellRegistry;
pub use crate::tree::{Arity, Command, CommandTree, Param, PathKind, ValueCompleter};
