//! Image preprocessing for text recognition
//!
//! Converts noisy, unevenly lit document photographs into clean
//! black/white images through a fixed sequence of transforms.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PrepConfig, PrepResult, StepTiming};
