//! Local-host adapters — everything lives under one runtime directory.
//!
//! - handlers register by binding a Unix socket in a per-category
//!   directory ([`SocketRegistry`], [`SocketRouter`]);
//! - the attention resource is an exclusive `flock` ([`LockFileAttention`]);
//! - the opt-out flag is a small marker file ([`FlagFilePreferences`]).

mod flag;
mod lock;
mod socket;

pub use flag::FlagFilePreferences;
pub use lock::LockFileAttention;
pub use socket::{SocketRegistry, SocketRouter};
