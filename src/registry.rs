//! Maps shell names to their activation templates and output formatters.
use std::collections::BTreeMap;
use std::fmt;

use phf::phf_map;

use crate::codegen::{self, Formatter};
use crate::error::{CompletionError, Result, ShellList};

static DESCRIPTIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "bash" => "Bourne again shell",
    "fish" => "Friendly interactive shell",
    "zsh" => "Z shell",
    "powershell" => "Windows PowerShell",
};

#[derive(Clone)]
pub struct Adapter {
    pub template: String,
    pub formatter: Formatter,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("template", &self.template)
            .finish()
    }
}

/// Filled once at startup; read-only while serving a request.
#[derive(Debug, Clone, Default)]
pub struct ShellRegistry {
    adapters: BTreeMap<String, Adapter>,
}

impl ShellRegistry {
    /// An empty registry.
    pub fn new() -> ShellRegistry {
        ShellRegistry {
            adapters: BTreeMap::new(),
        }
    }

    /// bash, fish, powershell and zsh.
    pub fn builtin() -> ShellRegistry {
        let mut registry = ShellRegistry::new();
        registry
            .register("bash", codegen::BASH_TEMPLATE, codegen::escaped)
            .register("zsh", codegen::ZSH_TEMPLATE, codegen::annotated)
            .register("fish", codegen::FISH_TEMPLATE, codegen::annotated)
            .register("powershell", codegen::POWERSHELL_TEMPLATE, codegen::plain);
        registry
    }

    /// Adds or replaces a shell.
    pub fn register(&mut self, shell: &str, template: &str, formatter: Formatter) -> &mut ShellRegistry {
        self.adapters.insert(
            shell.to_owned(),
            Adapter {
                template: template.to_owned(),
                formatter,
            },
        );
        self
    }

    pub fn resolve(&self, shell: &str) -> Option<&Adapter> {
        self.adapters.get(shell)
    }

    /// Registered shell names, sorted.
    pub fn shells(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// A short description of the built-in shells.
    pub fn description(&self, shell: &str) -> Option<&'static str> {
        DESCRIPTIONS.get(shell).cloned()
    }

    fn shell_list(&self) -> ShellList {
        ShellList(self.adapters.keys().cloned().collect())
    }

    /// Like `resolve` but fails with `UnsupportedShell`.
    pub fn require(&self, shell: &str) -> Result<&Adapter> {
        self.resolve(shell).ok_or_else(|| CompletionError::UnsupportedShell {
            shell: shell.to_owned(),
            supported: self.shell_list(),
        })
    }

    /// Uses `shell` if given, otherwise asks `detect`. Never falls back to a
    /// default shell.
    pub fn select<F>(&self, shell: Option<&str>, detect: F) -> Result<(String, &Adapter)>
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(shell) = shell {
            return self.require(shell).map(|adapter| (shell.to_owned(), adapter));
        }

        let detected = detect().ok_or_else(|| CompletionError::UnknownShell {
            reason: "failed to detect the shell".to_owned(),
            supported: self.shell_list(),
        })?;

        debug!("detected shell: {}", detected);
        match self.resolve(&detected) {
            Some(adapter) => Ok((detected, adapter)),
            None => Err(CompletionError::UnknownShell {
                reason: format!("detected `{}' which has no completion support", detected),
                supported: self.shell_list(),
            }),
        }
    }
}
