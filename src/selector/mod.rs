//! Selector core — decides which handler receives a captured event.
//!
//! Leaves first: [`candidate`] discovery, the [`attention`] coordinator,
//! the [`watchdog`], the forwarding [`gateway`], then the [`session`]
//! state machine that drives them and the [`driver`] that runs it.

pub mod attention;
pub mod candidate;
pub mod driver;
pub mod gateway;
pub mod session;
pub mod watchdog;

pub use candidate::{CapturedEvent, KeyCode, MEDIA_BUTTON_CATEGORY};
pub use driver::{Discovery, SessionHandle};
pub use gateway::{DispatchObserver, DispatchTicket};
pub use session::{Outcome, SelectionSession, SessionRequest, SessionSignal};
