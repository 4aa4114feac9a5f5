//! Core library for the `traceprof` CLI.
//!
//! This crate provides the internal building blocks used by the binary:
//! CLI argument types, run configuration, log parsing, record filtering,
//! endpoint and scenario aggregation, baseline diffing, and tabular
//! rendering. The primary user-facing interface is the `traceprof`
//! command-line application; library APIs may evolve as the CLI grows.
pub mod app;
pub mod args;
pub mod canon;
pub mod config;
pub mod error;
pub mod filter;
pub mod logger;
pub mod parse;
pub mod printer;
pub mod profiler;
pub mod stats;
