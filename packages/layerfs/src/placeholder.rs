//! Placeholder expansion for overlay string fields.
//!
//! The composer receives a [`Replacer`] at construction and runs it over
//! `source`, `workdir`, `type` and every header value before resolving
//! anything.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Text substitution applied to configuration strings.
pub trait Replacer: Send + Sync {
    fn replace_all(&self, input: &str) -> String;
}

impl<F> Replacer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn replace_all(&self, input: &str) -> String {
        self(input)
    }
}

/// Leaves every string untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReplacer;

impl Replacer for NoopReplacer {
    fn replace_all(&self, input: &str) -> String {
        input.to_string()
    }
}

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Expands `{env.NAME}` tokens. Unset variables expand to nothing.
#[derive(Clone)]
pub struct EnvReplacer {
    lookup: Lookup,
}

impl Default for EnvReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvReplacer {
    /// Read variables from the process environment.
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup` instead of the environment.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

impl Replacer for EnvReplacer {
    fn replace_all(&self, input: &str) -> String {
        lazy_static! {
            static ref ENV_PLACEHOLDER: Regex =
                Regex::new(r"\{env\.([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
        }

        ENV_PLACEHOLDER
            .replace_all(input, |caps: &Captures| {
                (self.lookup)(&caps[1]).unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_env() -> EnvReplacer {
        EnvReplacer::with_lookup(|name| match name {
            "BUCKET" => Some("assets".to_string()),
            "TOKEN" => Some("s3cr3t".to_string()),
            _ => None,
        })
    }

    #[test]
    fn expands_known_variables() {
        let r = fake_env();
        assert_eq!(
            r.replace_all("s3://store/{env.BUCKET}/site.zip"),
            "s3://store/assets/site.zip"
        );
        assert_eq!(r.replace_all("Bearer {env.TOKEN}"), "Bearer s3cr3t");
    }

    #[test]
    fn unset_variables_become_empty() {
        assert_eq!(fake_env().replace_all("x{env.NOPE}y"), "xy");
    }

    #[test]
    fn other_braces_are_left_alone() {
        let r = fake_env();
        assert_eq!(r.replace_all("{http.request.host}"), "{http.request.host}");
        assert_eq!(r.replace_all("{env.}"), "{env.}");
    }

    #[test]
    fn closures_are_replacers() {
        let shout = |s: &str| s.to_uppercase();
        assert_eq!(shout.replace_all("abc"), "ABC");
        assert_eq!(NoopReplacer.replace_all("{env.X}"), "{env.X}");
    }
}
