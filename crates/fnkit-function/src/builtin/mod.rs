//! Built-in functions for common operations

pub mod calculator;
pub mod echo;

pub use calculator::calculator_function;
pub use echo::echo_function;

use crate::FunctionSet;
use fnkit_core::Result;

/// Name of the candidate source returned by [`builtin_functions`]
pub const BUILTIN_SOURCE: &str = "builtin";

/// The built-in functions as one candidate source
pub fn builtin_functions() -> Result<FunctionSet> {
    Ok(FunctionSet::new(BUILTIN_SOURCE)
        .with(echo_function()?)
        .with(calculator_function()?))
}
