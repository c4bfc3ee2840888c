//! Prediction and rendering
//!
//! Run a loaded classifier on a feature record and format the outcome.

pub mod inference;

pub use inference::{format_prediction, render, OutputFormat, Predictor};
