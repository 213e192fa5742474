#![doc = "corpus-harvester-core: core logic library for corpus-harvester."]

//! This crate contains the harvesting and corpus assembly pipeline:
//! repository discovery, bounded breadth-first tree traversal, content
//! retrieval with a fallback download path, local persistence, and the
//! delimited corpus merge.
//!
//! Network access lives behind the [`contract::RepositoryHost`] trait; the CLI
//! crate provides the GitHub implementation and tests use the generated mocks.
//!
//! # Usage
//! Build a [`config::Config`] once, then call [`harvest::harvest`] to populate
//! the output tree and [`merge::merge_corpus`] to flatten it into the corpus file.

pub mod config;
pub mod contract;
pub mod discover;
pub mod filter;
pub mod harvest;
pub mod merge;
pub mod retrieve;
pub mod storage;
pub mod walk;
