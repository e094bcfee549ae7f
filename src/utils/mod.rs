//! The `utils` module provides utilities shared across `magstore`: the error
//! types every layer returns and the logging bootstrap.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
