//! Online/offline leaderboard.
//!
//! The local cache is always available. The hosted table is optional; when
//! it is missing or unreachable everything degrades to local-only.
//!
//! ## Realtime
//!
//! Push updates come from the `realtime` feature, on by default. A build
//! without it:
//! ```sh
//! cargo build --no-default-features
//! ```
//! fetches the board once on mount and then keeps it current by merging
//! this client's own submissions.

pub mod entry;
pub mod remote;
pub mod sync;

#[cfg(feature = "realtime")]
pub mod realtime;

pub use entry::*;
pub use remote::{ChangeFeedTarget, RemoteError, RemoteLeaderboard, RestLeaderboard};
pub use sync::{ChangeNotifier, LeaderboardSync, SaveState, SyncEvent};
