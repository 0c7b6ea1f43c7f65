//! Version-control history mining: log grammars, changesets, and
//! socio-technical analyses.
//!
//! Parses a VCS log (git, svn, hg, p4, tfs) into [`mining::Revision`]
//! records, groups them into [`changeset::Changeset`]s, and runs pure
//! analyses over the result: logical coupling, churn, code age, authorship,
//! entity effort, and author communication. Every analysis yields a
//! [`table::ResultTable`] ready for an external renderer.

pub mod age;
pub mod analysis;
pub mod authors;
pub mod changeset;
pub mod churn;
pub mod communication;
pub mod coupling;
pub mod effort;
pub mod grammar;
pub mod layers;
pub mod messages;
pub mod mining;
pub mod stats;
pub mod summary;
pub mod table;
