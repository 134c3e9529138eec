//! Transfer Lifecycle States
//!
//! State IDs are stored as SMALLINT.
//!
//! ```text
//! INITIATED → PENDING → COMPLETED
//!     ↓          ↓
//!   FAILED     FAILED
//! ```
//!
//! PROCESSING and CANCELLED exist for administrative use; the synchronous
//! transfer path never enters them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransferStatus {
    /// Request accepted, accounts resolved
    Initiated = 0,

    /// Exchange rate obtained, legs being committed
    Pending = 10,

    /// Reserved for asynchronous processing
    Processing = 20,

    /// Terminal: both legs and the transfer record committed
    Completed = 40,

    /// Terminal: nothing was committed
    Failed = -10,

    /// Terminal: administrative cancellation
    Cancelled = -20,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }

    /// Transitions taken by the synchronous transfer path.
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (Initiated, Pending) | (Initiated, Failed) | (Pending, Completed) | (Pending, Failed)
        )
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Initiated),
            10 => Some(TransferStatus::Pending),
            20 => Some(TransferStatus::Processing),
            40 => Some(TransferStatus::Completed),
            -10 => Some(TransferStatus::Failed),
            -20 => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Initiated => "INITIATED",
            TransferStatus::Pending => "PENDING",
            TransferStatus::Processing => "PROCESSING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferStatus::from_id(value).ok_or(())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INITIATED" => Ok(TransferStatus::Initiated),
            "PENDING" => Ok(TransferStatus::Pending),
            "PROCESSING" => Ok(TransferStatus::Processing),
            "COMPLETED" => Ok(TransferStatus::Completed),
            "FAILED" => Ok(TransferStatus::Failed),
            "CANCELLED" => Ok(TransferStatus::Cancelled),
            other => Err(format!("unknown transfer status: {}", other)),
        }
    }
}
