use serde::{Deserialize, Serialize};

/// Service entry as known to the decoder's FIC state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: u32,
    pub label: String,
}

impl Service {
    pub fn new(service_id: u32, label: impl Into<String>) -> Self {
        Self {
            service_id,
            label: label.into(),
        }
    }
}

/// One component of a service, pointing at the subchannel that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceComponent {
    pub service_id: u32,
    pub component_index: u8,
    pub subchannel_id: Option<u8>,
}

/// Subchannel organisation. `id` stays `None` until the decoder has seen
/// the subchannel signalled in the FIC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subchannel {
    pub id: Option<u8>,
    pub bitrate_kbps: u32,
}

impl Subchannel {
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }
}
