//! Three-tier retrieval: index search, chronological timeline, batch fetch

mod dates;
mod fetch;
mod index;
mod search;
mod timeline;

pub use dates::{parse_date_bound, parse_instant, DateBound};
pub use fetch::{get_observations, FetchRequest};
pub use index::IndexEntry;
pub use search::{search, SearchRequest};
pub use timeline::{timeline, Anchor, Timeline, TimelineRequest};
