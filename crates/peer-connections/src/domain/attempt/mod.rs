//! # Outgoing Attempts
//!
//! One retrying state machine per configured outbound target.
//!
//! ```text
//!            connect ok                 disconnect notice
//! Connecting ─────────→ Connected(h) ─────────────────────→ Connecting
//!     │  ↑                                  (re-dial, no delay)
//!     │  │ timer expired
//!     │  └──────────── WaitingRetry
//!     │ connect err        ↑
//!     └────────────────────┘ (fixed delay, no growth, no jitter)
//! ```
//!
//! Exactly one of {in-flight connect, pending retry timer, live connection}
//! exists per target. There is no terminal state: attempts retry for the
//! lifetime of the process.
//!
//! The machine is pure. Each transition returns an [`AttemptAction`] the
//! service must carry out (dial, arm a timer) and every armed timer is
//! tagged with a generation so that an expiry from a cancelled timer is
//! recognised and suppressed.

mod config;
mod machine;
mod types;

pub use config::{RetryPolicy, DEFAULT_RETRY_DELAY};
pub use machine::OutgoingAttempt;
pub use types::{AttemptAction, AttemptInfo, AttemptState};
