lazy_static! {
    pub static ref COLORS_ENABLED: bool = {
        use std::os::unix::io::AsRawFd;
        nix::unistd::isatty(std::io::stderr().as_raw_fd()).unwrap_or(false)
    };
}

/// Prints a diagnostic prefixed with the program name to stderr.
#[macro_export]
macro_rules! print_err {
    ($prog:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        if *$crate::macros::COLORS_ENABLED {
            eprintln!("{}{}{}: {}{}",
                ::crossterm::style::SetAttribute(::crossterm::style::Attribute::Bold),
                ::crossterm::style::SetForegroundColor(::crossterm::style::Color::Yellow),
                $prog,
                message,
                ::crossterm::style::SetAttribute(::crossterm::style::Attribute::Reset));
        } else {
            eprintln!("{}: {}", $prog, message);
        }
    }};
}
