//! Request handlers, one module per API area.

pub mod engine;
pub mod util;
