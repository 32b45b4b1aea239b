//! Repository acquisition.

pub mod cloner;

pub use cloner::{clone_repository, repository_id, CloneOptions, CloneResult};
