//! Logical field name to physical column name conversion.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Converts a logical field name from a filter expression into the
/// identifier used by the store.
///
/// Implementations must be deterministic: the same field can appear in a
/// predicate and in an ordering clause and has to resolve to the same column.
pub trait IdentMapper {
    fn convert(&self, name: &str) -> String;
}

impl<F> IdentMapper for F
where
    F: Fn(&str) -> String,
{
    fn convert(&self, name: &str) -> String {
        self(name)
    }
}

/// Identity mapping, used when no mapper is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl IdentMapper for Passthrough {
    fn convert(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Case conversion applied to the whole field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCase {
    Snake,
    Camel,
    Pascal,
    Kebab,
    Upper,
    Lower,
    ScreamingSnake,
}

impl IdentMapper for NameCase {
    fn convert(&self, name: &str) -> String {
        match self {
            NameCase::Snake => name.to_case(Case::Snake),
            NameCase::Camel => name.to_case(Case::Camel),
            NameCase::Pascal => name.to_case(Case::Pascal),
            NameCase::Kebab => name.to_case(Case::Kebab),
            // `Case::Upper` joins words with spaces
            NameCase::Upper => name.to_uppercase(),
            NameCase::Lower => name.to_lowercase(),
            NameCase::ScreamingSnake => name.to_case(Case::Snake).to_uppercase(),
        }
    }
}

/// Explicit alias table with an optional case conversion for everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasMapper {
    aliases: HashMap<String, String>,
    fallback: Option<NameCase>,
}

impl AliasMapper {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases, fallback: None }
    }

    pub fn with_fallback(mut self, case: NameCase) -> Self {
        self.fallback = Some(case);
        self
    }

    pub fn alias(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        self.aliases.insert(logical.into(), physical.into());
        self
    }
}

impl IdentMapper for AliasMapper {
    fn convert(&self, name: &str) -> String {
        if let Some(physical) = self.aliases.get(name) {
            return physical.clone();
        }
        match self.fallback {
            Some(case) => case.convert(name),
            None => name.to_string(),
        }
    }
}
