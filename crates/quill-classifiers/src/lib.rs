//! quill-classifiers: evaluation engine for authorship attribution.
//!
//! Given per-author documents as fixed-width feature vectors, this crate
//! measures how well a classifier identifies the author of an unseen
//! document: seeded partitioning of the corpus, per-split preprocessing,
//! interchangeable prediction strategies, cross-validation, rank-based
//! scoring, greedy feature-group search and an obfuscation-correction
//! pipeline for adversarial texts.
//!
//! Every experiment is reproducible: the partitioner reseeds itself on every
//! call and only samples from sorted authors and documents.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod deobfuscation;
pub mod error;
pub mod experiment;
pub mod feature_selection;
pub mod io;
pub mod models;
pub mod partition;
pub mod preprocessing;
pub mod report;
pub mod scoring;
pub mod strategy;

pub use error::{EvalError, Result};
