#[macro_use]
extern crate log;
#[macro_use]
extern crate compline;

mod doctor;

use std::path::PathBuf;
use std::process::exit;

use structopt::StructOpt;

use compline::logger::install_logger_from_env;
use compline::{Arity, Candidate, Command, CommandTree, Engine, Param, PathKind, ShellRegistry};

const PROG_NAME: &str = "compline";

#[derive(Debug, StructOpt)]
#[structopt(name = "compline", about = "Shell completion for compline itself.")]
enum Opt {
    /// List the supported shells.
    Shells,
    /// Print the activation code.
    Source {
        /// The shell. Detected if omitted.
        shell: Option<String>,
    },
    /// Install the activation code.
    Install {
        /// The shell. Detected if omitted.
        shell: Option<String>,
        /// The file to write to.
        #[structopt(short, long, parse(from_os_str))]
        path: Option<PathBuf>,
        /// Append to the file.
        #[structopt(long, conflicts_with = "no_append")]
        append: bool,
        /// Overwrite the file.
        #[structopt(long)]
        no_append: bool,
    },
    /// Print a diagnosis report.
    Doctor,
}

fn shell_candidates(registry: &ShellRegistry) -> Vec<Candidate> {
    registry
        .shells()
        .into_iter()
        .map(|shell| match registry.description(shell) {
            Some(description) => Candidate::with_help(shell, description),
            None => Candidate::new(shell),
        })
        .collect()
}

/// Mirrors `Opt`.
fn command_tree(registry: &ShellRegistry) -> compline::Result<CommandTree> {
    let shells = shell_candidates(registry);
    let shell_arg = || {
        Param::argument("shell")
            .arity(Arity::ZeroOrOne)
            .help("The shell")
    };

    let installable = shells.clone();
    CommandTree::new(
        Command::new(PROG_NAME)
            .param(Param::flag("help", &["--help", "-h"]).help("Prints help information"))
            .param(Param::flag("version", &["--version", "-V"]).help("Prints version information"))
            .subcommand(Command::new("shells").help("List the supported shells."))
            .subcommand(
                Command::new("source")
                    .help("Print the activation code.")
                    .param(shell_arg().choices(shells)),
            )
            .subcommand(
                Command::new("install")
                    .help("Install the activation code.")
                    .param(shell_arg().callback(move |_, _| Ok(installable.clone())))
                    .param(
                        Param::option("path", &["--path", "-p"])
                            .help("The file to write to.")
                            .path(PathKind::Any),
                    )
                    .param(
                        Param::flag("append", &["--append"])
                            .secondary_flags(&["--no-append"])
                            .help("Append to the file."),
                    ),
            )
            .subcommand(Command::new("doctor").help("Print a diagnosis report.")),
    )
}

fn main() {
    let registry = ShellRegistry::builtin();
    let tree = match command_tree(&registry) {
        Ok(tree) => tree,
        Err(err) => {
            print_err!(PROG_NAME, "{}", err);
            exit(1);
        }
    };

    let engine = Engine::new(tree, registry, PROG_NAME);
    engine.serve_and_exit();

    if let Err(err) = install_logger_from_env(PROG_NAME) {
        print_err!(PROG_NAME, "failed to initialize the logger: {}", err);
    }

    let opt = Opt::from_args();
    debug!("opt: {:?}", opt);
    match opt {
        Opt::Shells => {
            for shell in shell_candidates(engine.registry()) {
                match shell.help {
                    Some(help) => println!("{:<12}{}", shell.value, help),
                    None => println!("{}", shell.value),
                }
            }
        }
        Opt::Source { shell } => match engine.activation_code(shell.as_deref()) {
            Ok((_, code)) => println!("{}", code),
            Err(err) => {
                print_err!(PROG_NAME, "{}", err);
                exit(1);
            }
        },
        Opt::Install {
            shell,
            path,
            append,
            no_append,
        } => {
            let append = match (append, no_append) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            match engine.install(shell.as_deref(), path.as_deref(), append) {
                Ok((shell, path)) => println!("{} completion installed in {}", shell, path.display()),
                Err(err) => {
                    print_err!(PROG_NAME, "{}", err);
                    exit(1);
                }
            }
        }
        Opt::Doctor => doctor::main(&engine),
    }
}
