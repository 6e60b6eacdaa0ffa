//! Domain events captured by the task recordings.

use serde::Serialize;

use super::log::Timestamped;
use crate::scene::{ConnectorIndex, FireIndex, LeverIndex, WireIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireEventKind {
    Pickup,
    Connect,
    Swap,
    /// Panel lever pulled: the puzzle's completion marker.
    Complete,
}

/// What happened on the wiring panel, in stable indices only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireAction {
    /// `wire` lifted out of `connector`.
    Pickup {
        wire: WireIndex,
        connector: ConnectorIndex,
    },
    /// `wire` pushed into the empty `connector`.
    Connect {
        wire: WireIndex,
        connector: ConnectorIndex,
    },
    /// `wire` (seated in `connector`) and `target_wire` (seated in
    /// `target_connector`) trade places.
    Swap {
        wire: WireIndex,
        connector: ConnectorIndex,
        target_wire: WireIndex,
        target_connector: ConnectorIndex,
    },
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireEvent {
    pub timestamp: f32,
    pub action: WireAction,
}

impl WireEvent {
    pub fn kind(&self) -> WireEventKind {
        match self.action {
            WireAction::Pickup { .. } => WireEventKind::Pickup,
            WireAction::Connect { .. } => WireEventKind::Connect,
            WireAction::Swap { .. } => WireEventKind::Swap,
            WireAction::Complete => WireEventKind::Complete,
        }
    }
}

/// Absolute remaining health of one fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FireStateEvent {
    pub timestamp: f32,
    pub fire: FireIndex,
    pub health: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtinguisherActivationEvent {
    pub timestamp: f32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeverPullEvent {
    pub timestamp: f32,
    pub lever: LeverIndex,
}

/// Everything the fire-suppression task logs, in one ordered stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FireTaskEvent {
    FireState(FireStateEvent),
    Extinguisher(ExtinguisherActivationEvent),
}

/// Closed union over every event family a recording can receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DomainEvent {
    Wire(WireEvent),
    FireState(FireStateEvent),
    ExtinguisherActivation(ExtinguisherActivationEvent),
    LeverPull(LeverPullEvent),
}

impl DomainEvent {
    pub fn family(&self) -> &'static str {
        match self {
            DomainEvent::Wire(_) => "wire",
            DomainEvent::FireState(_) => "fire-state",
            DomainEvent::ExtinguisherActivation(_) => "extinguisher",
            DomainEvent::LeverPull(_) => "lever-pull",
        }
    }
}

impl Timestamped for WireEvent {
    fn timestamp(&self) -> f32 {
        self.timestamp
    }
}

impl Timestamped for FireStateEvent {
    fn timestamp(&self) -> f32 {
        self.timestamp
    }
}

impl Timestamped for ExtinguisherActivationEvent {
    fn timestamp(&self) -> f32 {
        self.timestamp
    }
}

impl Timestamped for LeverPullEvent {
    fn timestamp(&self) -> f32 {
        self.timestamp
    }
}

impl Timestamped for FireTaskEvent {
    fn timestamp(&self) -> f32 {
        match self {
            FireTaskEvent::FireState(e) => e.timestamp,
            FireTaskEvent::Extinguisher(e) => e.timestamp,
        }
    }
}

impl Timestamped for DomainEvent {
    fn timestamp(&self) -> f32 {
        match self {
            DomainEvent::Wire(e) => e.timestamp,
            DomainEvent::FireState(e) => e.timestamp,
            DomainEvent::ExtinguisherActivation(e) => e.timestamp,
            DomainEvent::LeverPull(e) => e.timestamp,
        }
    }
}

impl From<WireEvent> for DomainEvent {
    fn from(event: WireEvent) -> Self {
        DomainEvent::Wire(event)
    }
}

impl From<FireStateEvent> for DomainEvent {
    fn from(event: FireStateEvent) -> Self {
        DomainEvent::FireState(event)
    }
}

impl From<ExtinguisherActivationEvent> for DomainEvent {
    fn from(event: ExtinguisherActivationEvent) -> Self {
        DomainEvent::ExtinguisherActivation(event)
    }
}

impl From<LeverPullEvent> for DomainEvent {
    fn from(event: LeverPullEvent) -> Self {
        DomainEvent::LeverPull(event)
    }
}
