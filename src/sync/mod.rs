//! Locking and wake-up primitives used between the sampling producer and
//! reader sessions.
//!
//! Two lock domains exist and are never nested the wrong way round:
//! - [`FastLock`]: per sensor, guards raw sample/timestamp pairs, held for
//!   a couple of word copies only.
//! - [`SessionLock`]: per reader session, held across formatting and
//!   copy-out, released before any sleep on a [`WaitQueue`].
//!
//! Every blocking wait in the crate goes through [`WaitQueue::wait_until`]
//! so it can be cancelled with an [`Interrupt`].

pub mod fast_lock;
pub mod interrupt;
pub mod session_lock;
pub mod wait_queue;

pub use fast_lock::FastLock;
pub use interrupt::Interrupt;
pub use session_lock::{SessionGuard, SessionLock};
pub use wait_queue::WaitQueue;
