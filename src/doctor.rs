//! A diagnosis report to attach to bug reports.
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};

use compline::detect::detect_shell;
use compline::logger::LOG_ENV;
use compline::paths::log_file_path;
use compline::Engine;

macro_rules! print_title {
    ($title:expr) => {
        println!(
            "{}{}{}{}{}",
            SetAttribute(Attribute::Reset),
            SetAttribute(Attribute::Bold),
            SetAttribute(Attribute::Underlined),
            $title,
            SetAttribute(Attribute::Reset)
        );
    };
}

macro_rules! print_value {
    ($key:expr, $value:expr) => {
        println!(
            "{}{}={}{}{}",
            SetAttribute(Attribute::Reset),
            $key,
            SetForegroundColor(Color::Green),
            $value,
            SetAttribute(Attribute::Reset)
        );
    };
}

macro_rules! print_env {
    ($key:expr) => {
        print_value!($key, std::env::var($key).unwrap_or_else(|_| "".to_owned()));
    };
}

pub fn main(engine: &Engine) {
    print_title!("Build Environment");
    println!("{}", env!("RUSTC_VERSION"));
    println!("{}", env!("CARGO_VERSION"));
    println!();

    print_title!("compline");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    print_value!("trigger", engine.complete_var_name());
    print_value!("shells", engine.registry().shells().join(" "));
    println!();

    print_title!("Shell");
    print_value!("detected", detect_shell().unwrap_or_else(|| "(unknown)".to_owned()));
    print_env!("SHELL");
    print_env!("SHLVL");
    print_env!("TERM");
    println!();

    print_title!("Logging");
    print_env!(LOG_ENV);
    match log_file_path(engine.prog_name()) {
        Ok(path) => {
            print_value!("file", path.display());
        }
        Err(err) => {
            print_value!("file", format!("(unavailable: {})", err));
        }
    }
    println!();
}
