//! Sequential RSS fetching rendered into a markdown checklist digest.
//!
//! The crate is split along the run's data flow:
//!
//! - [`feed`] - fetch routes, HTTP transport, the paced fetcher and the item parser
//! - [`digest`] - markdown rendering and persistence of the digest file
//! - [`storage`] / [`notify`] - host collaborators the writer delegates to
//! - [`run`] - the "Fetch RSS Feeds" action tying everything together
//!
//! Configuration is read once per run from [`config::Config`].

pub mod config;
pub mod digest;
pub mod feed;
pub mod notify;
pub mod run;
pub mod storage;
