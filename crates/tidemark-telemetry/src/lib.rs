//! Data-directory paths, audit-log I/O and token estimation for tidemark

mod io;
mod paths;
mod tokens;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::{Paths, HOME_ENV};
pub use tokens::{estimate_tokens, CHARS_PER_TOKEN};
pub use types::ShrinkRecord;
