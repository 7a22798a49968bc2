//
// lib.rs
// Imaging-Workflow-rs
//
// Exposes the crate's modules and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - February 2026

// Public surface of the library: each module mirrors a CLI verb or shared utility.
pub mod acquire;
pub mod cli;
pub mod config;
pub mod demo;
pub mod dicom_access;
pub mod fhir;
pub mod models;
pub mod qido;
pub mod scu;
pub mod transmit;
pub mod uid;
pub mod worklist;

pub use cli::{run as run_cli, Cli, Commands};
