//! Build pipeline for webscratch.
//!
//! Each stage lives in its own module; [`pipeline::run_build`] runs them in
//! order: archive extraction, the manual Squeak gate, UTF-8 recoding, and the
//! external JS engine (self-test, then compile).

pub mod archive;
pub mod engine;
pub mod gate;
pub mod pipeline;
pub mod recode;

#[cfg(test)]
mod test_support;
