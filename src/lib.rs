//! Translate parsed filter expressions into sea-query WHERE groups and ORDER BY clauses.

pub mod ast;
pub mod condition;
pub mod config;
pub mod naming;
pub mod target;
pub mod translator;

pub use ast::{Filter, FilterKind, OrderSpec, Parameter, QueryData, Scalar};
pub use condition::{CompareOp, Junction, Predicate, WhereGroup};
pub use config::{ConfigError, MappingConfig};
pub use naming::{AliasMapper, IdentMapper, NameCase, Passthrough};
pub use target::QueryTarget;
pub use translator::{TranslateError, Translator, DEFAULT_MAX_DEPTH};
