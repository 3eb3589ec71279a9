//! Connectivity trigger adapter
//!
//! Turns online/offline transitions into drain passes on the persistence
//! queue:
//! - `ConnectivitySignal`: the shared online flag
//! - `HttpProbe`: optional poller that keeps the flag current
//! - `QueueDrainer`: drains at startup when online and after each reconnect

mod drainer;
mod probe;
mod signal;

pub use drainer::{QueueDrainer, QueueNotice};
pub use probe::{HttpProbe, ProbeConfig};
pub use signal::ConnectivitySignal;
