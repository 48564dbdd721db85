use std::process::Command;

fn tool_version(tool: &str) -> String {
    match Command::new(tool).arg("--version").output() {
        Ok(result) => String::from_utf8_lossy(&result.stdout).trim().to_owned(),
        Err(_) => format!("{} (unknown version)", tool),
    }
}

fn main() {
   println!("cargo:rustc-env=RUSTC_VERSION={}", tool_version("rustc"));
   println!("cargo:rustc-env=CARGO_VERSION={}", tool_version("cargo"));
}
