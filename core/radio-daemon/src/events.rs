//! Event pump: the single context that delivers hardware broadcasts.
//!
//! Simulated drivers and IPC clients both push into one channel; one thread
//! drains it in order and hands each broadcast to the registry.

use radio_core::RadioRegistry;
use radio_protocol::HardwareEvent;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::sim::SimulatedHardware;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Reported by the (simulated) drivers themselves.
    Hardware,
    /// Injected over IPC.
    Client,
}

#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub source: EventSource,
    pub event: HardwareEvent,
}

impl InboundEvent {
    pub fn new(source: EventSource, event: HardwareEvent) -> Self {
        Self { source, event }
    }
}

pub fn spawn_event_pump(
    registry: Arc<RadioRegistry>,
    hardware: Arc<SimulatedHardware>,
    receiver: Receiver<InboundEvent>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("radio-event-pump".to_string())
        .spawn(move || {
            for inbound in receiver {
                deliver(&registry, &hardware, inbound);
            }
            tracing::info!("Event channel closed; event pump exiting");
        })
}

fn deliver(registry: &RadioRegistry, hardware: &SimulatedHardware, inbound: InboundEvent) {
    if inbound.source == EventSource::Client {
        hardware.absorb(&inbound.event);
    }

    let accepted = registry.dispatch_event(&inbound.event);
    tracing::debug!(
        action = inbound.event.action(),
        source = ?inbound.source,
        accepted = ?accepted,
        "Delivered hardware event"
    );
}
