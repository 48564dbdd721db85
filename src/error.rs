use std::fmt;

/// Names of the shells a registry knows about, printed in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellList(pub Vec<String>);

impl fmt::Display for ShellList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0.join(", "))
        }
    }
}

#[derive(Debug, Fail, PartialEq)]
pub enum CompletionError {
    /// The trigger is set but there is nothing to complete.
    #[fail(display = "malformed completion request: {}", _0)]
    MalformedInvocation(String),
    #[fail(display = "unsupported shell `{}' (supported shells: {})", shell, supported)]
    UnsupportedShell { shell: String, supported: ShellList },
    /// Auto-detection failed or found a shell nobody registered.
    #[fail(
        display = "unknown shell: {}; specify the shell explicitly (supported shells: {})",
        reason, supported
    )]
    UnknownShell { reason: String, supported: ShellList },
    /// Absorbed by the engine: the parameter just yields no candidates.
    #[fail(display = "completion provider for `{}' failed: {}", param, reason)]
    CompletionProvider { param: String, reason: String },
    #[fail(display = "invalid command tree: {}", _0)]
    InvalidTree(String),
}

pub type Result<I> = std::result::Result<I, CompletionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unsupported_shell_lists_known_shells() {
        let err = CompletionError::UnsupportedShell {
            shell: "tcsh".to_owned(),
            supported: ShellList(vec!["bash".to_owned(), "zsh".to_owned()]),
        };

        assert_eq!(
            err.to_string(),
            "unsupported shell `tcsh' (supported shells: bash, zsh)"
        );
    }

    #[test]
    fn empty_shell_list() {
        let err = CompletionError::UnknownShell {
            reason: "no parent process".to_owned(),
            supported: ShellList::default(),
        };

        assert_eq!(
            err.to_string(),
            "unknown shell: no parent process; specify the shell explicitly (supported shells: none)"
        );
    }
}
