//! Sessions and their registry.
//!
//! A session binds an identifier to one child-process transport and one
//! resolved auth identity, independent of any network connection. The
//! registry is the single piece of cross-connection shared state: it
//! creates sessions (validating auth first), resolves them by id, and
//! destroys them.

mod registry;
mod session;

pub use registry::SessionRegistry;
pub use session::{AuthIdentity, Session, SessionError};
