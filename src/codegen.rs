//! Activation scripts and the per-shell candidate output.
use crate::completion::Candidate;

pub const BASH_TEMPLATE: &str = include_str!("templates/bash.sh");
pub const ZSH_TEMPLATE: &str = include_str!("templates/zsh.zsh");
pub const FISH_TEMPLATE: &str = include_str!("templates/fish.fish");
pub const POWERSHELL_TEMPLATE: &str = include_str!("templates/powershell.ps1");

/// Turns a candidate into one line of output. The flag tells whether the
/// fragment under the cursor is inside an unterminated quote.
pub type Formatter = fn(&Candidate, bool) -> String;

/// What an activation script needs to know about the host program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub prog_name: String,
    pub complete_var: String,
    /// Baked into the generated code and set on every completion request.
    pub extra_env: Vec<(String, String)>,
}

impl Activation {
    pub fn new(prog_name: &str, complete_var: &str) -> Activation {
        Activation {
            prog_name: prog_name.to_owned(),
            complete_var: complete_var.to_owned(),
            extra_env: Vec::new(),
        }
    }

    /// Renders `template`. Unknown placeholders are left alone.
    pub fn render(&self, template: &str) -> String {
        let posix_env: String = self
            .extra_env
            .iter()
            .map(|(key, value)| format!("{}={} ", key, single_quote(value)))
            .collect();
        let powershell_env: String = self
            .extra_env
            .iter()
            .map(|(key, value)| format!("        $Env:{} = {}\n", key, powershell_quote(value)))
            .collect();

        template
            .replace("{{prog_name}}", &self.prog_name)
            .replace("{{func_name}}", &identifier(&self.prog_name))
            .replace("{{complete_var}}", &self.complete_var)
            .replace("{{extra_env_powershell}}", &powershell_env)
            .replace("{{extra_env}}", &posix_env)
    }
}

/// The name of the environment variable which triggers completion:
/// `foo-bar` becomes `_FOO_BAR_COMPLETE`.
pub fn complete_var_name(prog_name: &str) -> String {
    format!("_{}_COMPLETE", identifier(prog_name).to_ascii_uppercase())
}

/// Replaces everything but ASCII alphanumerics and `_` with `_`.
pub fn identifier(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect()
}

/// `value`.
pub fn plain(candidate: &Candidate, _quoted: bool) -> String {
    candidate.value.clone()
}

/// `value` with blanks, backslashes, quotes and parentheses escaped unless
/// the user already opened a quote. Bash inserts candidates verbatim.
pub fn escaped(candidate: &Candidate, quoted: bool) -> String {
    if quoted {
        return candidate.value.clone();
    }

    let mut value = String::with_capacity(candidate.value.len());
    for ch in candidate.value.chars() {
        if ch.is_whitespace() || "\\\"'()".contains(ch) {
            value.push('\\');
        }

        value.push(ch);
    }

    value
}

/// `value<TAB>help`, or `value` if there is no help.
pub fn annotated(candidate: &Candidate, _quoted: bool) -> String {
    match &candidate.help {
        Some(help) if !help.trim().is_empty() => {
            let help: Vec<&str> = help.split_whitespace().collect();
            format!("{}\t{}", candidate.value, help.join(" "))
        }
        _ => candidate.value.clone(),
    }
}

fn is_safe(ch: char) -> bool {
    ch.is_alphanumeric() || "@%+=:,./-_".contains(ch)
}

/// Quotes `s` for a POSIX shell, leaving it alone if that is not needed.
pub fn single_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_owned();
    }

    if s.chars().all(is_safe) {
        return s.to_owned();
    }

    // 'it'"'"'s'
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

fn powershell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn complete_var() {
        assert_eq!(complete_var_name("foo-bar"), "_FOO_BAR_COMPLETE");
        assert_eq!(complete_var_name("git"), "_GIT_COMPLETE");
        assert_eq!(complete_var_name("my.tool_2"), "_MY_TOOL_2_COMPLETE");
    }

    #[test]
    fn formatting() {
        assert_eq!(plain(&Candidate::with_help("commit", "Record changes"), false), "commit");
        assert_eq!(
            annotated(&Candidate::with_help("commit", "Record\n  changes"), false),
            "commit\tRecord changes"
        );
        assert_eq!(annotated(&Candidate::new("checkout"), false), "checkout");
        assert_eq!(annotated(&Candidate::with_help("x", "  "), false), "x");
    }

    #[test]
    fn bash_escaping() {
        let candidate = Candidate::with_help("my notes (v2)'s.txt", "ignored");
        assert_eq!(escaped(&candidate, false), "my\\ notes\\ \\(v2\\)\\'s.txt");
        assert_eq!(escaped(&candidate, true), "my notes (v2)'s.txt");
        assert_eq!(escaped(&Candidate::new("a\\b\"c\td"), false), "a\\\\b\\\"c\\\td");
        assert_eq!(escaped(&Candidate::new("*.rs"), false), "*.rs");
    }

    #[test]
    fn quoting() {
        assert_eq!(single_quote(""), "''");
        assert_eq!(single_quote("/usr/bin:ok"), "/usr/bin:ok");
        assert_eq!(single_quote("a b"), "'a b'");
        assert_eq!(single_quote("it's"), "'it'\"'\"'s'");
        assert_eq!(powershell_quote("it's"), "'it''s'");
    }

    #[test]
    fn render_bash() {
        let mut activation = Activation::new("foo-bar", "_FOO_BAR_COMPLETE");
        activation.extra_env.push(("FOO_MODE".to_owned(), "fast lane".to_owned()));
        let code = activation.render(BASH_TEMPLATE);

        assert!(code.contains("_foo_bar_completion() {"));
        assert!(code.contains("mapfile -t COMPREPLY < <(env FOO_MODE"));
        assert!(code.contains("env FOO_MODE='fast lane' _FOO_BAR_COMPLETE=complete-bash \"$1\""));
        assert!(code.contains("complete -F _foo_bar_completion -o default foo-bar"));
        assert!(!code.contains("{{"));
    }

    #[test]
    fn render_other_shells() {
        let activation = Activation::new("git", "_GIT_COMPLETE");
        for template in &[ZSH_TEMPLATE, FISH_TEMPLATE, POWERSHELL_TEMPLATE] {
            let code = activation.render(template);
            assert!(code.contains("_GIT_COMPLETE"), "{}", code);
            assert!(!code.contains("{{"), "{}", code);
        }

        assert!(activation.render(ZSH_TEMPLATE).starts_with("#compdef git\n"));
        assert!(activation
            .render(FISH_TEMPLATE)
            .contains("_GIT_COMPLETE=complete-fish COMMANDLINE=(commandline -cp) git"));
    }
}
