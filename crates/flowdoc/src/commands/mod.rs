//! CLI command implementations.

mod generate;
mod index;

pub(crate) use generate::GenerateArgs;
pub(crate) use index::IndexArgs;
