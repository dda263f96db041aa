//! Codec implementations backing the filter pipeline.

pub mod ccitt;
pub mod lzw;
pub mod predictor;
