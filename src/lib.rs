//! rosterload - batch user import engine for CSV and XML roster files.
//!
//! Core library exposing the reader, importer, repository, and server
//! modules behind the `roster` binary.

// Model types use `from_str` methods that return Self (infallible parse),
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod cli;
pub mod config;
pub mod importer;
pub mod migrations;
pub mod models;
pub mod reader;
pub mod repository;
pub mod schema;
pub mod server;
