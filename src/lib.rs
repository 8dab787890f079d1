// Copyright 2025 Cornell University
// released under MIT License

pub mod diagnostic;
pub mod errors;
pub mod flatten;
pub mod hierarchy;
pub mod ir;
pub mod mapping;
pub mod parser;
pub mod rewrite;
pub mod run;
pub mod scan;
pub mod serialize;
pub mod span;
pub mod token;

#[cfg(test)]
mod fixtures;
