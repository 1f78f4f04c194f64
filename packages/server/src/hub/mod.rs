//! Live party hubs.
//!
//! Each party that has at least one participant gets one `PartyHub`, the
//! single writer of its playback state. `HubManager` creates hubs on first
//! join and tears them down once they sit empty.

pub mod error;
pub mod manager;
pub mod outbound;
pub mod party_hub;
pub mod persister;
pub mod router;

pub use error::HubError;
pub use manager::HubManager;
pub use outbound::{OutboundReceiver, OutboundSender};
pub use party_hub::{JoinedSession, LeaveOutcome, PartyHub, PartySummary};
pub use router::BroadcastRouter;
