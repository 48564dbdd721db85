//! The trigger protocol: a host program started with `_<PROG>_COMPLETE` set
//! prints activation code or completion candidates instead of running.
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cmdline;
use crate::codegen::{complete_var_name, Activation};
use crate::completion::{self, Candidate};
use crate::config::Config;
use crate::context::{self, CompletionContext};
use crate::detect::detect_shell;
use crate::error::{CompletionError, Result};
use crate::install;
use crate::logger;
use crate::registry::ShellRegistry;
use crate::tree::CommandTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the activation code.
    Source,
    /// Print the candidates for the buffer.
    Complete,
    /// Write the activation code to the shell's startup files.
    Install,
}

/// A parsed trigger value such as `complete-zsh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mode: Mode,
    /// `None` means "detect it".
    pub shell: Option<String>,
}

impl Instruction {
    pub fn parse(value: &str) -> Result<Instruction> {
        let (mode, shell) = match value.find('-') {
            Some(index) => (&value[..index], Some(value[index + 1..].to_owned())),
            None => (value, None),
        };

        let mode = match mode {
            "source" => Mode::Source,
            "complete" => Mode::Complete,
            "install" => Mode::Install,
            _ => {
                return Err(CompletionError::MalformedInvocation(format!(
                    "unrecognized instruction `{}'",
                    value
                )))
            }
        };

        if shell.as_deref() == Some("") {
            return Err(CompletionError::MalformedInvocation(format!(
                "missing shell name in `{}'",
                value
            )));
        }

        // `complete` alone predates the other shells.
        let shell = match (mode, shell) {
            (Mode::Complete, None) => Some("bash".to_owned()),
            (_, shell) => shell,
        };

        Ok(Instruction { mode, shell })
    }
}

/// Everything a completion request reads from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// The value of the trigger variable.
    pub instruction: String,
    /// The process arguments, program name included.
    pub args: Vec<String>,
    /// `$COMMANDLINE`.
    pub commandline: Option<String>,
    /// `$COMP_WORDS`.
    pub comp_words: Option<String>,
    /// `$COMP_CWORD`.
    pub comp_cword: Option<String>,
}

/// The words to complete, unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionLine {
    /// The program name, the typed words and the fragment.
    pub words: Vec<String>,
    /// The fragment is inside an unterminated quote.
    pub quoted: bool,
}

/// Filenames on the command line need not be UTF-8.
fn lossy_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn lossy_var(key: &str) -> Option<String> {
    std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
}

impl Invocation {
    /// Returns `None` if `complete_var` is unset or empty, i.e. the program
    /// should run normally.
    pub fn from_env(complete_var: &str) -> Option<Invocation> {
        let instruction = lossy_var(complete_var).filter(|value| !value.is_empty())?;
        Some(Invocation {
            instruction,
            args: lossy_args(std::env::args_os()),
            commandline: lossy_var("COMMANDLINE"),
            comp_words: lossy_var("COMP_WORDS"),
            comp_cword: lossy_var("COMP_CWORD"),
        })
    }

    /// The line to complete. Arguments win over `$COMMANDLINE`, which wins
    /// over `$COMP_WORDS`. Arguments are words as the shell sees them, i.e.
    /// with their quotes and backslashes.
    pub fn completion_line(&self) -> Result<CompletionLine> {
        if let Some((prog, words)) = self.args.split_first().filter(|(_, words)| !words.is_empty()) {
            let mut line = CompletionLine {
                words: vec![prog.clone()],
                quoted: false,
            };

            for word in words {
                let split = cmdline::split(word)?;
                line.quoted = split.open_quote;
                line.words.push(split.words.concat());
            }

            return Ok(line);
        }

        if let Some(commandline) = &self.commandline {
            let split = cmdline::split(commandline)?;
            let quoted = split.open_quote;
            return Ok(CompletionLine {
                words: split.into_completion_line(),
                quoted,
            });
        }

        if let (Some(comp_words), Some(comp_cword)) = (&self.comp_words, &self.comp_cword) {
            let cword: usize = comp_cword.trim().parse().map_err(|_| {
                CompletionError::MalformedInvocation(format!("invalid COMP_CWORD: `{}'", comp_cword))
            })?;

            let split = cmdline::split(comp_words)?;
            let mut words: Vec<String> = split.words.iter().take(cword).cloned().collect();
            words.push(split.words.get(cword).cloned().unwrap_or_default());
            return Ok(CompletionLine {
                quoted: split.open_quote && cword + 1 >= split.words.len(),
                words,
            });
        }

        Err(CompletionError::MalformedInvocation(
            "no command line to complete (pass it as arguments or in $COMMANDLINE)".to_owned(),
        ))
    }
}

/// Owns everything a completion request needs. Build one per process.
pub struct Engine {
    tree: CommandTree,
    registry: ShellRegistry,
    config: Config,
    prog_name: String,
    complete_var: String,
    extra_env: Vec<(String, String)>,
    detector: fn() -> Option<String>,
}

impl Engine {
    pub fn new(tree: CommandTree, registry: ShellRegistry, prog_name: &str) -> Engine {
        Engine {
            tree,
            registry,
            config: Config::default(),
            prog_name: prog_name.to_owned(),
            complete_var: complete_var_name(prog_name),
            extra_env: Vec::new(),
            detector: detect_shell,
        }
    }

    pub fn config(mut self, config: Config) -> Engine {
        self.config = config;
        self
    }

    /// Overrides the trigger variable name derived from the program name.
    pub fn complete_var(mut self, name: &str) -> Engine {
        self.complete_var = name.to_owned();
        self
    }

    /// Adds an environment variable to the generated activation code.
    pub fn extra_env(mut self, key: &str, value: &str) -> Engine {
        self.extra_env.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Replaces the shell auto-detection.
    pub fn detector(mut self, detector: fn() -> Option<String>) -> Engine {
        self.detector = detector;
        self
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn registry(&self) -> &ShellRegistry {
        &self.registry
    }

    pub fn complete_var_name(&self) -> &str {
        &self.complete_var
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    pub fn resolve(&self, line: &[String]) -> Result<CompletionContext> {
        context::resolve(&self.tree, line, &self.config)
    }

    pub fn complete(&self, line: &[String]) -> Result<Vec<Candidate>> {
        let ctx = self.resolve(line)?;
        Ok(completion::complete(&ctx))
    }

    fn activation(&self) -> Activation {
        let mut activation = Activation::new(&self.prog_name, &self.complete_var);
        activation.extra_env = self.extra_env.clone();
        activation
    }

    /// Returns the shell name and its activation code. The shell is
    /// detected if not given.
    pub fn activation_code(&self, shell: Option<&str>) -> Result<(String, String)> {
        let (shell, adapter) = self.registry.select(shell, self.detector)?;
        Ok((shell, self.activation().render(&adapter.template)))
    }

    /// Installs the activation code and returns the shell name and the
    /// file written to.
    pub fn install(
        &self,
        shell: Option<&str>,
        path: Option<&Path>,
        append: Option<bool>,
    ) -> std::result::Result<(String, PathBuf), failure::Error> {
        let (shell, code) = self.activation_code(shell)?;
        let (path, append) = install::destination(&shell, &self.prog_name, path, append)?;
        install::write_script(&path, &code, append)?;
        Ok((shell, path))
    }

    /// Serves `invocation`. Returns the exit status. Nothing is written to
    /// `out` unless the request succeeds.
    pub fn handle(&self, invocation: &Invocation, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
        debug!("handle: {:?}", invocation);
        match self.execute(invocation) {
            Ok(lines) => {
                for line in lines {
                    if writeln!(out, "{}", line).is_err() {
                        return 1;
                    }
                }

                out.flush().ok();
                0
            }
            Err(error) => {
                warn!("handle: {}", error);
                writeln!(err, "{}: {}", self.prog_name, error).ok();
                1
            }
        }
    }

    fn execute(&self, invocation: &Invocation) -> std::result::Result<Vec<String>, failure::Error> {
        let instruction = Instruction::parse(&invocation.instruction)?;
        let shell = instruction.shell.as_deref();
        match instruction.mode {
            Mode::Source => {
                let (_, code) = self.activation_code(shell)?;
                Ok(vec![code])
            }
            Mode::Complete => {
                let (_, adapter) = self.registry.select(shell, self.detector)?;
                let line = invocation.completion_line()?;
                let candidates = self.complete(&line.words)?;
                trace!("handle: {} candidates", candidates.len());
                Ok(candidates
                    .iter()
                    .map(|c| (adapter.formatter)(c, line.quoted))
                    .collect())
            }
            Mode::Install => {
                let (shell, path) = self.install(shell, None, None)?;
                Ok(vec![format!("{} completion installed in {}", shell, path.display())])
            }
        }
    }

    /// Serves the request if the trigger variable is set. Returns `None`
    /// if the program should run normally.
    pub fn serve(&self) -> Option<i32> {
        let invocation = Invocation::from_env(&self.complete_var)?;
        // stderr belongs to the shell too.
        match logger::install_logger_from_env(&self.prog_name) {
            Ok(true) => (),
            _ => logger::install_quiet_panic_hook(),
        }

        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let status = self.handle(&invocation, &mut stdout.lock(), &mut stderr.lock());
        Some(status)
    }

    /// Like `serve` but exits the process once the request is served.
    pub fn serve_and_exit(&self) {
        if let Some(status) = self.serve() {
            std::process::exit(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Command, Param, PathKind};
    use pretty_assertions::assert_eq;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_owned()).collect()
    }

    fn engine() -> Engine {
        let tree = CommandTree::new(
            Command::new("git")
                .subcommand(
                    Command::new("commit")
                        .help("Record changes")
                        .param(Param::option("message", &["--message", "-m"]))
                        .param(Param::flag("verbose", &["--verbose"]).help("Be verbose")),
                )
                .subcommand(Command::new("checkout").help("Switch branches")),
        )
        .unwrap();

        Engine::new(tree, ShellRegistry::builtin(), "git").detector(|| None)
    }

    fn invocation(instruction: &str, args: &[&str]) -> Invocation {
        Invocation {
            instruction: instruction.to_owned(),
            args: strings(args),
            ..Invocation::default()
        }
    }

    fn run(engine: &Engine, invocation: &Invocation) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = engine.handle(invocation, &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn instructions() {
        assert_eq!(
            Instruction::parse("source-zsh").unwrap(),
            Instruction { mode: Mode::Source, shell: Some("zsh".to_owned()) }
        );
        assert_eq!(
            Instruction::parse("complete").unwrap(),
            Instruction { mode: Mode::Complete, shell: Some("bash".to_owned()) }
        );
        assert_eq!(
            Instruction::parse("install").unwrap(),
            Instruction { mode: Mode::Install, shell: None }
        );
        assert!(Instruction::parse("explode-bash").is_err());
        assert!(Instruction::parse("complete-").is_err());
    }

    #[test]
    fn completes_subcommands() {
        let engine = engine();
        let (status, out, err) = run(&engine, &invocation("complete-bash", &["git", "c"]));
        assert_eq!(status, 0);
        assert_eq!(out, "commit\ncheckout\n");
        assert_eq!(err, "");

        let (_, out, _) = run(&engine, &invocation("complete-zsh", &["git", "c"]));
        assert_eq!(out, "commit\tRecord changes\ncheckout\tSwitch branches\n");
    }

    #[test]
    fn free_text_option_prints_nothing() {
        let engine = engine();
        let (status, out, _) = run(&engine, &invocation("complete-fish", &["git", "commit", "-m", ""]));
        assert_eq!(status, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn supplied_flag_is_not_offered_again() {
        let engine = engine();
        let (status, out, _) = run(
            &engine,
            &invocation("complete-bash", &["git", "commit", "--verbose", "--"]),
        );
        assert_eq!(status, 0);
        assert_eq!(out, "--message\n");
    }

    #[test]
    fn unsupported_shell() {
        let engine = engine();
        let (status, out, err) = run(&engine, &invocation("complete-tcsh", &["git", "c"]));
        assert_eq!(status, 1);
        assert_eq!(out, "");
        assert_eq!(
            err,
            "git: unsupported shell `tcsh' (supported shells: bash, fish, powershell, zsh)\n"
        );
    }

    #[test]
    fn undetectable_shell() {
        let engine = engine();
        let (status, out, err) = run(&engine, &invocation("source", &["git"]));
        assert_eq!(status, 1);
        assert_eq!(out, "");
        assert!(err.contains("specify the shell explicitly"), "{}", err);

        let engine = engine.detector(|| Some("fish".to_owned()));
        let (status, out, _) = run(&engine, &invocation("source", &["git"]));
        assert_eq!(status, 0);
        assert!(out.contains("complete-fish"));
    }

    #[test]
    fn missing_buffer_is_malformed() {
        let engine = engine();
        let (status, out, err) = run(&engine, &invocation("complete-bash", &["git"]));
        assert_eq!(status, 1);
        assert_eq!(out, "");
        assert!(err.starts_with("git: malformed completion request"), "{}", err);
    }

    #[test]
    fn source_code() {
        let engine = engine().extra_env("GIT_PAGER", "cat");
        let (status, out, _) = run(&engine, &invocation("source-bash", &["git"]));
        assert_eq!(status, 0);
        assert!(out.contains("env GIT_PAGER=cat _GIT_COMPLETE=complete-bash"), "{}", out);
    }

    #[test]
    fn commandline_buffer() {
        let engine = engine();
        let mut request = invocation("complete-zsh", &["git"]);
        request.commandline = Some("git commit --".to_owned());
        let (_, out, _) = run(&engine, &request);
        assert_eq!(out, "--message\n--verbose\tBe verbose\n");

        request.commandline = Some("git ".to_owned());
        let (_, out, _) = run(&engine, &request);
        assert_eq!(out, "commit\tRecord changes\ncheckout\tSwitch branches\n");
    }

    #[test]
    fn comp_words_buffer() {
        let request = Invocation {
            instruction: "complete".to_owned(),
            args: strings(&["git"]),
            comp_words: Some("git commit ".to_owned()),
            comp_cword: Some("2".to_owned()),
            ..Invocation::default()
        };
        assert_eq!(request.completion_line().unwrap().words, strings(&["git", "commit", ""]));

        let request = Invocation {
            comp_words: Some("git ch".to_owned()),
            comp_cword: Some("1".to_owned()),
            ..request
        };
        assert_eq!(request.completion_line().unwrap().words, strings(&["git", "ch"]));

        let request = Invocation {
            comp_cword: Some("x".to_owned()),
            ..request
        };
        assert!(request.completion_line().is_err());
    }

    #[test]
    fn bash_words_are_unquoted_and_candidates_escaped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("my notes.txt"), "").unwrap();
        let dir = tmp.path().to_str().unwrap();

        let tree = CommandTree::new(
            Command::new("cat").param(Param::argument("file").path(PathKind::FileOnly)),
        )
        .unwrap();
        let engine = Engine::new(tree, ShellRegistry::builtin(), "cat").detector(|| None);

        let typed = format!("{}/my", dir);
        let (status, out, _) = run(&engine, &invocation("complete-bash", &["cat", &typed]));
        assert_eq!(status, 0);
        assert_eq!(out, format!("{}/my\\ notes.txt\n", dir));

        let typed = format!("{}/my\\ n", dir);
        let (_, out, _) = run(&engine, &invocation("complete-bash", &["cat", &typed]));
        assert_eq!(out, format!("{}/my\\ notes.txt\n", dir));

        // Inside an open quote bash wants the raw value.
        let typed = format!("'{}/my n", dir);
        let (status, out, _) = run(&engine, &invocation("complete-bash", &["cat", &typed]));
        assert_eq!(status, 0);
        assert_eq!(out, format!("{}/my notes.txt\n", dir));
    }

    #[test]
    fn quoted_words_from_arguments() {
        let request = invocation("complete-bash", &["git", "'it'\\''s'", "\"a b", ""]);
        assert_eq!(
            request.completion_line().unwrap(),
            CompletionLine {
                words: strings(&["git", "it's", "a b", ""]),
                quoted: false,
            }
        );

        let request = invocation("complete-bash", &["git", "\"a b"]);
        assert_eq!(
            request.completion_line().unwrap(),
            CompletionLine {
                words: strings(&["git", "a b"]),
                quoted: true,
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments() {
        use std::os::unix::ffi::OsStringExt;

        let args = lossy_args(vec![
            OsString::from("git"),
            OsString::from("commit"),
            OsString::from_vec(b"caf\xE9".to_vec()),
            OsString::from(""),
        ]);
        assert_eq!(args, strings(&["git", "commit", "caf\u{FFFD}", ""]));

        let request = Invocation {
            instruction: "complete-bash".to_owned(),
            args,
            ..Invocation::default()
        };
        let (status, out, err) = run(&engine(), &request);
        assert_eq!(status, 0);
        assert_eq!(out, "");
        assert_eq!(err, "");
    }

    #[test]
    fn custom_complete_var() {
        let engine = engine();
        assert_eq!(engine.complete_var_name(), "_GIT_COMPLETE");

        let engine = engine.complete_var("GIT_TAB");
        let (_, code) = engine.activation_code(Some("fish")).unwrap();
        assert!(code.contains("GIT_TAB=complete-fish"));
    }

    #[test]
    fn install_to_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("git.fish");

        let engine = engine();
        let (shell, written) = engine.install(Some("fish"), Some(&path), Some(false)).unwrap();
        assert_eq!(shell, "fish");
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("_GIT_COMPLETE=complete-fish"));
        assert!(content.ends_with('\n'));

        let err = engine.install(Some("tcsh"), Some(&path), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompletionError>(),
            Some(CompletionError::UnsupportedShell { .. })
        ));
    }

    #[test]
    fn repeatable() {
        let engine = engine();
        let line = strings(&["git", "commit", "--verbose", "-"]);
        assert_eq!(engine.complete(&line).unwrap(), engine.complete(&line).unwrap());
    }
}
