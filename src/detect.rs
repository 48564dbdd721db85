//! Best-effort detection of the shell which runs us.
use std::fs;
use std::process::Command;

use nix::unistd::getppid;

/// Returns the name of the parent process, e.g. `bash`, or `None` if it
/// cannot be determined.
pub fn detect_shell() -> Option<String> {
    let ppid = getppid().as_raw();
    let name = proc_comm(ppid).or_else(|| ps_comm(ppid))?;
    let shell = shell_name(&name)?;
    trace!("detect_shell: ppid={}, comm='{}', shell='{}'", ppid, name, shell);
    Some(shell)
}

fn proc_comm(pid: i32) -> Option<String> {
    fs::read_to_string(format!("/proc/{}/comm", pid)).ok()
}

fn ps_comm(pid: i32) -> Option<String> {
    let output = Command::new("ps")
        .args(&["-o", "comm=", "-p", &pid.to_string()])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout).ok()
}

/// `-bash` (a login shell), `/usr/local/bin/fish` and `pwsh.exe` are
/// `bash`, `fish` and `powershell`.
fn shell_name(comm: &str) -> Option<String> {
    let name = comm.trim().trim_start_matches('-');
    let name = name.rsplit(|ch| ch == '/' || ch == '\\').next().unwrap_or(name);
    match name.trim_end_matches(".exe") {
        "" => None,
        // PowerShell 7.
        "pwsh" => Some("powershell".to_owned()),
        name => Some(name.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_process_names() {
        assert_eq!(shell_name("bash\n"), Some("bash".to_owned()));
        assert_eq!(shell_name("-zsh"), Some("zsh".to_owned()));
        assert_eq!(shell_name("/usr/local/bin/fish"), Some("fish".to_owned()));
        assert_eq!(shell_name("C:\\Windows\\powershell.exe"), Some("powershell".to_owned()));
        assert_eq!(shell_name("pwsh"), Some("powershell".to_owned()));
        assert_eq!(shell_name("/usr/bin/pwsh.exe"), Some("powershell".to_owned()));
        assert_eq!(shell_name("  \n"), None);
    }

    #[test]
    fn reads_own_process_name() {
        // Not every platform has procfs; when it does, our own name is there.
        if let Some(comm) = proc_comm(std::process::id() as i32) {
            assert!(!comm.trim().is_empty());
        }
    }
}
