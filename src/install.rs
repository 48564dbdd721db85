//! Writes activation scripts to where shells pick them up.
use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use failure::{format_err, Error};

use crate::paths::default_completion_path;

/// Asks PowerShell where its profile is.
fn powershell_profile() -> Result<PathBuf, Error> {
    for exe in &["pwsh", "powershell"] {
        let output = match Command::new(exe)
            .args(&["-NoProfile", "-Command", "echo $profile"])
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                debug!("install: failed to run {}: {}", exe, err);
                continue;
            }
        };

        let profile = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if output.status.success() && !profile.is_empty() {
            return Ok(PathBuf::from(profile));
        }
    }

    Err(format_err!("failed to locate the PowerShell profile"))
}

/// Decides where `code` for `shell` goes and whether it is appended. An
/// explicit `path` is appended to unless `append` says otherwise.
pub fn destination(
    shell: &str,
    prog_name: &str,
    path: Option<&Path>,
    append: Option<bool>,
) -> Result<(PathBuf, bool), Error> {
    if let Some(path) = path {
        return Ok((path.to_owned(), append.unwrap_or(true)));
    }

    let (path, default_append) = match default_completion_path(shell, prog_name)? {
        Some(location) => location,
        None if shell == "powershell" => (powershell_profile()?, true),
        None => {
            return Err(format_err!(
                "no default completion location for `{}'; give the destination path explicitly",
                shell
            ))
        }
    };

    Ok((path, append.unwrap_or(default_append)))
}

/// Writes `code` (plus a newline) to `path`, creating missing directories.
pub fn write_script(path: &Path, code: &str, append: bool) -> Result<(), Error> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(code.as_bytes())?;
    file.write_all(b"\n")?;

    info!("install: wrote {} bytes to {}", code.len() + 1, path.display());
    Ok(())
}
