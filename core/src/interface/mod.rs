pub mod events;
pub mod record;
pub mod service;

pub use events::{DabDateTime, MessageLevel, RadioEvents, TiiMeasurement};
pub use record::{trim_label, ScanResult, ServiceInfo};
pub use service::{Service, ServiceComponent, Subchannel};
