//! Line-oriented duplex transport to the child process.
//!
//! One transport owns one subprocess. All exchanges are strictly
//! sequential: a reply must be read before the next request is written,
//! because the child speaks one ordered line stream, not a multiplexed
//! protocol. The session layer enforces that ordering by funneling all
//! access through a single mutex.

mod process;

pub use process::{ProcessTransport, TransportError};

use async_trait::async_trait;

/// The seam between sessions and the subprocess.
///
/// `&mut self` on every method is deliberate: exclusive access makes
/// double-initialization and interleaved reads structurally impossible
/// for any caller holding the transport.
#[async_trait]
pub trait LineTransport: Send {
    /// Write one line (newline appended) to the child's stdin and flush.
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Read the next line from the child's stdout, trimmed.
    async fn read_line(&mut self) -> Result<String, TransportError>;

    /// Tear down the child process. Idempotent, safe when never started.
    async fn close(&mut self);
}
