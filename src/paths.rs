use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

fn home_dir() -> io::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "where's your home dir?"))
}

/// `~/.compline`.
pub fn compline_dir() -> io::Result<PathBuf> {
    let dir = home_dir()?.join(".compline");
    create_dir_all(&dir)?;
    Ok(dir)
}

pub fn log_file_path(name: &str) -> io::Result<PathBuf> {
    let log_dir = compline_dir()?.join("log");
    create_dir_all(&log_dir)?;
    Ok(log_dir.join(&format!("{}.log", name)))
}

/// Where `shell` looks for completion scripts by default. `None` if we
/// don't know, or if the location has to be asked from the shell itself.
pub fn default_completion_path(shell: &str, prog_name: &str) -> io::Result<Option<(PathBuf, bool)>> {
    Ok(completion_path_in(&home_dir()?, shell, prog_name))
}

/// The completion script location of `shell` under `home` and whether the
/// script should be appended to it.
fn completion_path_in(home: &Path, shell: &str, prog_name: &str) -> Option<(PathBuf, bool)> {
    match shell {
        "fish" => Some((
            home.join(".config")
                .join("fish")
                .join("completions")
                .join(format!("{}.fish", prog_name)),
            false,
        )),
        "bash" => Some((home.join(".bash_completion"), true)),
        "zsh" => {
            let ohmyzsh = home.join(".oh-my-zsh");
            if ohmyzsh.exists() {
                Some((ohmyzsh.join("completions").join(format!("_{}", prog_name)), false))
            } else {
                Some((home.join(".zshrc"), true))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn completion_paths() {
        let home = tempfile::tempdir().unwrap();
        let home = home.path();

        assert_eq!(
            completion_path_in(home, "fish", "foo"),
            Some((home.join(".config/fish/completions/foo.fish"), false))
        );
        assert_eq!(
            completion_path_in(home, "bash", "foo"),
            Some((home.join(".bash_completion"), true))
        );
        assert_eq!(completion_path_in(home, "zsh", "foo"), Some((home.join(".zshrc"), true)));
        assert_eq!(completion_path_in(home, "powershell", "foo"), None);

        fs::create_dir(home.join(".oh-my-zsh")).unwrap();
        assert_eq!(
            completion_path_in(home, "zsh", "foo"),
            Some((home.join(".oh-my-zsh/completions/_foo"), false))
        );
    }
}
