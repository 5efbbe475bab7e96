//! The demo catalog of tools, resources, and prompts
//!
//! [`build_registry`] is the single place where handlers are registered.

use std::{fmt, str::FromStr};

use crate::{errors::AppError, registry::Registry};

pub mod prompts;
pub mod resources;
pub mod tools;

pub const SERVER_NAME: &str = "Demo";

/// Which variant of the example server to expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogProfile {
    /// `greet`/`add` return sampling message envelopes and the elicitation
    /// tools are registered.
    #[default]
    Structured,
    /// `greet`/`add` return plain values; no elicitation tools.
    Plain,
}

impl CatalogProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for CatalogProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogProfile {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "plain" => Ok(Self::Plain),
            _ => Err(()),
        }
    }
}

pub fn build_registry(profile: CatalogProfile) -> Result<Registry, AppError> {
    let mut registry = Registry::new();

    for handler in tools::catalog(profile) {
        registry.register(handler)?;
    }
    for handler in resources::catalog() {
        registry.register(handler)?;
    }
    for handler in prompts::catalog() {
        registry.register(handler)?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;

    fn names(registry: &Registry, category: Category) -> Vec<String> {
        registry
            .handlers(category)
            .map(|handler| handler.name.clone())
            .collect()
    }

    #[test]
    fn structured_profile_registers_elicitation_tools() {
        let registry = build_registry(CatalogProfile::Structured).expect("registry");
        assert_eq!(
            names(&registry, Category::Tool),
            vec!["greet", "add", "elicit_feedback", "elicit_feedback2"]
        );
        assert_eq!(
            names(&registry, Category::Resource),
            vec!["greeting://{name}", "greeting://test", "employees://details"]
        );
        assert_eq!(names(&registry, Category::Prompt), vec!["greet_user"]);
    }

    #[test]
    fn plain_profile_omits_elicitation_tools() {
        let registry = build_registry(CatalogProfile::Plain).expect("registry");
        assert_eq!(names(&registry, Category::Tool), vec!["greet", "add"]);
    }

    #[test]
    fn profile_parses_case_insensitively() {
        assert_eq!("Plain".parse::<CatalogProfile>(), Ok(CatalogProfile::Plain));
        assert_eq!(
            " structured ".parse::<CatalogProfile>(),
            Ok(CatalogProfile::Structured)
        );
        assert!("fancy".parse::<CatalogProfile>().is_err());
    }
}
