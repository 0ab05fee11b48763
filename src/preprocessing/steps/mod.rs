//! Individual preprocessing steps

pub mod binarize;
pub mod blur;
pub mod equalize;
pub mod erode;
pub mod grayscale;
