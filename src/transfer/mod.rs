//! Account-to-account transfers
//!
//! A transfer debits one account, converts the amount at the provider's
//! rate and credits another account. Both legs and the transfer record are
//! committed together or not at all.
//!
//! # State Machine
//!
//! ```text
//! INITIATED → PENDING → COMPLETED
//!     ↓          ↓
//!   FAILED     FAILED
//! ```
//!
//! Only COMPLETED transfers are persisted; failures are reported to the
//! caller and logged.

pub mod coordinator;
pub mod state;
pub mod types;

pub use coordinator::{TransferCoordinator, TransferPolicy};
pub use state::TransferStatus;
pub use types::{Transfer, TransferCommand};
