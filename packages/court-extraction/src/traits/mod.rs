//! Core trait abstractions.

pub mod ingestor;
