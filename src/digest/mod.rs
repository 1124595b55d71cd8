//! Markdown digest rendering and persistence.

mod render;
mod writer;

pub use render::{render_digest, FeedSection};
pub use writer::{digest_file_name, DigestError, DigestWriter};
