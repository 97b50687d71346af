//! Dummy Value Synthesizer
//!
//! - [`synthesize`]: type to placeholder literal, side effects and approximations
//! - [`expression`]: the narrow matcher for literal and input-reference expressions

pub mod expression;
pub mod synthesize;

pub use expression::{classify_glob, literal_expression, trivial_literal, GlobSource, InputReference};
pub use synthesize::{synthesize, Approximation, DummyValue, SideEffect, Synthesis};
