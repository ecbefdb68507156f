//! Secret references in `config.toml`.
//!
//! Any credential value may point outside the file:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//! - anything else: used verbatim

/// Stands in for a literal secret in printed configuration.
pub const REDACTED: &str = "<redacted>";

/// A parsed credential value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// Literal value.
    Plain(&'a str),
    /// Environment variable name.
    Env(&'a str),
    /// Entry in the `pass` password store.
    Pass(&'a str),
}

impl<'a> SecretRef<'a> {
    /// Classifies `value` by prefix.
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Returns true if resolving would read something outside the file.
    pub fn is_indirect(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }

    /// Produces the secret value.
    pub fn resolve(&self) -> Result<String, String> {
        match self {
            Self::Plain(value) => Ok((*value).to_string()),
            Self::Env(var) => std::env::var(var)
                .map_err(|_| format!("environment variable `{}` is not set", var)),
            Self::Pass(path) => pass_show(path),
        }
    }
}

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

/// Masks a literal secret; references are safe to show and kept verbatim.
pub fn redact(value: &str) -> String {
    if SecretRef::parse(value).is_indirect() {
        value.to_string()
    } else {
        REDACTED.to_string()
    }
}

fn pass_show(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}
