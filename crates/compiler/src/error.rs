//! Error types for the Branchline code generator.

use thiserror::Error;

/// Errors produced while compiling a script tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A link, goto or choice names a node that does not exist.
    #[error("unresolved symbol '{symbol}' referenced at instruction {at}")]
    UnresolvedSymbol { symbol: String, at: usize },
}
