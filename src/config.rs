/// Behaviour switches of the completion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Offer option flags even if the fragment does not look like a flag.
    pub complete_options: bool,
    /// Characters which introduce an option flag.
    pub option_prefixes: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            complete_options: false,
            option_prefixes: "-".to_owned(),
        }
    }
}

impl Config {
    /// Returns true if `fragment` starts with one of the option prefixes.
    pub fn is_flag_like(&self, fragment: &str) -> bool {
        match fragment.chars().next() {
            Some(ch) => self.option_prefixes.contains(ch),
            None => false,
        }
    }
}
