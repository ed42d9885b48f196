//! Unit tests for dockside configuration types.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Defaults, accessors and serialisation
//! - [`validation`] - `AppConfig::validate` and post-merge normalisation
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence tests

mod helpers;
