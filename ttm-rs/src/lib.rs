//! TTM: a macro-expansion, text-rewriting interpreter.
//!
//! Program text is scanned left to right.  A call `#<name;arg;...>` is
//! replaced by its result, which is scanned again; a passive call
//! `##<name;...>` is replaced by its result without rescanning.  Text in
//! `<...>` is copied with the outer brackets removed.
//!
//! See [`Ttm`] for the embedding API.

pub mod buffer;
pub mod builtins;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dict;
pub mod engine;
pub mod error;
pub mod props;
pub mod stream;
pub mod symtab;

pub use engine::{Meta, Outcome, Ttm};
pub use error::{Error, ErrorKind, Failure, Result};
