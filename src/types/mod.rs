mod form;
mod order;

pub use form::{FormData, FormField};
pub use order::{FeedOrder, UserOrder};

/// Sequence number of a refresh, issued in increasing order
/// by the [`crate::poll::PollController`].
pub type Generation = u64;

/// First entry to fetch.
pub type Offset = u64;

/// Maximum number of entries to fetch.
pub type Limit = u64;
