//! Biosurveillance Control - command-line client for the biosurveillance dashboard

pub mod cli;
pub mod commands;
pub mod context;
pub mod errors;
pub mod output;
