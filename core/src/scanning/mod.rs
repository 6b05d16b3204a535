pub mod monitor;
pub mod scanner;
pub mod session;

pub use monitor::{ScanMonitor, ScanState};
pub use scanner::{ChannelOutcome, ChannelScanner};
pub use session::EngineSession;
