use crate::generator::profile::{ChannelProfile, SignalModel};
use dabscancore::interface::{
    DabDateTime, MessageLevel, RadioEvents, Service, ServiceComponent, Subchannel,
};
use dabscancore::prelude::{CoreResult, DecoderEngine, EngineFactory, InputDevice};
use log::debug;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Hands out one [`SimulatedEngine`] per scan phase, seeded with the profile
/// of whatever channel the input is tuned to.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngineFactory {
    profiles: HashMap<u32, ChannelProfile>,
}

impl SimulatedEngineFactory {
    pub fn new(profiles: HashMap<u32, ChannelProfile>) -> Self {
        Self { profiles }
    }
}

impl EngineFactory for SimulatedEngineFactory {
    type Engine = SimulatedEngine;

    fn create(
        &mut self,
        input: &dyn InputDevice,
        events: Arc<dyn RadioEvents>,
    ) -> CoreResult<SimulatedEngine> {
        Ok(SimulatedEngine::new(
            self.profiles.get(&input.frequency()).cloned(),
            events,
        ))
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Decoder stand-in that raises notifications from its own thread on the
/// schedule described by a [`ChannelProfile`].
pub struct SimulatedEngine {
    profile: Option<ChannelProfile>,
    events: Arc<dyn RadioEvents>,
    discovered: Arc<Mutex<Vec<Service>>>,
    worker: Option<Worker>,
}

impl SimulatedEngine {
    pub fn new(profile: Option<ChannelProfile>, events: Arc<dyn RadioEvents>) -> Self {
        Self {
            profile,
            events,
            discovered: Arc::new(Mutex::new(Vec::new())),
            worker: None,
        }
    }

    fn halt_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                debug!("simulated engine worker panicked");
            }
        }
    }
}

impl DecoderEngine for SimulatedEngine {
    fn restart(&mut self, scan_mode: bool) {
        self.halt_worker();
        if let Ok(mut discovered) = self.discovered.lock() {
            discovered.clear();
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let notifier = Notifier {
            profile: self.profile.clone(),
            events: self.events.clone(),
            discovered: self.discovered.clone(),
            pause: Box::new(move |delay| {
                matches!(stop_rx.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
            }),
        };
        let handle = thread::spawn(move || notifier.run(scan_mode));
        self.worker = Some(Worker { stop_tx, handle });
    }

    fn stop(&mut self) {
        self.halt_worker();
    }

    fn service_list(&self) -> Vec<Service> {
        self.discovered
            .lock()
            .map(|services| services.clone())
            .unwrap_or_default()
    }

    fn components_of(&self, service: &Service) -> Vec<ServiceComponent> {
        self.profile
            .as_ref()
            .and_then(|profile| profile.service(service.service_id))
            .map(|profile| {
                profile
                    .components
                    .iter()
                    .enumerate()
                    .map(|(idx, component)| ServiceComponent {
                        service_id: profile.sid,
                        component_index: idx as u8,
                        subchannel_id: component.subchannel,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn subchannel_of(&self, component: &ServiceComponent) -> Subchannel {
        self.profile
            .as_ref()
            .and_then(|profile| profile.service(component.service_id))
            .and_then(|service| service.components.get(component.component_index as usize))
            .map(|component| Subchannel {
                id: component.subchannel,
                bitrate_kbps: component.bitrate_kbps,
            })
            .unwrap_or_default()
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.halt_worker();
    }
}

/// Body of the notification thread.
struct Notifier {
    profile: Option<ChannelProfile>,
    events: Arc<dyn RadioEvents>,
    discovered: Arc<Mutex<Vec<Service>>>,
    /// Sleeps for the given delay; false once the engine has been stopped.
    pause: Box<dyn Fn(Duration) -> bool + Send>,
}

impl Notifier {
    fn run(self, scan_mode: bool) {
        let mode = if scan_mode { "scan" } else { "full" };
        self.events
            .on_message(MessageLevel::Information, "receiver started", mode);

        // An empty channel never says anything.
        let Some(profile) = self.profile.clone() else {
            return;
        };
        if !profile.presence {
            return;
        }
        if scan_mode {
            if (self.pause)(profile.presence_delay()) {
                self.events.on_signal_presence(true);
            }
            return;
        }
        self.receive(&profile);
    }

    fn receive(&self, profile: &ChannelProfile) {
        let mut model = SignalModel::new(profile);
        let (fine, coarse) = model.frequency_offset();
        self.events.on_frequency_corrector_change(fine, coarse);
        self.events.on_snr(model.measured_snr());
        self.events.on_new_null_symbol(model.null_symbol());
        self.events.on_new_impulse_response(model.impulse_response());

        if !(self.pause)(profile.sync_delay()) {
            return;
        }
        if !profile.sync {
            self.events.on_sync_change(false);
            self.events
                .on_message(MessageLevel::Error, "sync lost", "no null symbol found");
            return;
        }

        self.events.on_sync_change(true);
        self.events.on_new_ensemble(profile.ensemble_id);
        self.events.on_ensemble_label(&profile.ensemble_label);
        self.events.on_fib_decode_success(true, &[0u8; 32]);
        self.events.on_date_time_update(DabDateTime {
            year: 2024,
            month: 1,
            day: 1,
            ..Default::default()
        });

        for service in &profile.services {
            if !(self.pause)(profile.service_interval()) {
                return;
            }
            if let Ok(mut discovered) = self.discovered.lock() {
                discovered.push(Service::new(service.sid, service.label.clone()));
            }
            self.events.on_service_detected(service.sid);
            self.events.on_constellation_points(model.constellation());
        }

        self.events.on_tii_measurement(model.tii());
    }
}
