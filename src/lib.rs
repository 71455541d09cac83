//! Lectio library exports

pub mod core;
pub mod explain;
pub mod reader;

#[cfg(test)]
pub mod test_support;
