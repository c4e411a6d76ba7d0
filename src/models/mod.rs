//! Core data models: reference records, rosters, options and results.

mod datasheet;
mod faction;
mod links;
mod options;
mod result;
mod roster;
mod stratagem;
pub mod vocabulary;

pub use datasheet::*;
pub use faction::*;
pub use links::*;
pub use options::*;
pub use result::*;
pub use roster::*;
pub use stratagem::*;

use thiserror::Error;

/// Invariant violations when building a model value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{entity} is missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}
