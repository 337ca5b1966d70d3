use nbsetup_api::Collection;

use super::candidate::{Candidate, Fields};

/// Component template groups of a device type, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ComponentKind {
    #[strum(serialize = "interface")]
    Interface,
    #[strum(serialize = "power")]
    PowerPort,
    #[strum(serialize = "console")]
    ConsolePort,
    #[strum(serialize = "rear_port")]
    RearPort,
    #[strum(serialize = "front_port")]
    FrontPort,
}

impl ComponentKind {
    /// Rear ports precede front ports: a front port names its rear port.
    pub const ORDER: [Self; 5] = [
        Self::Interface,
        Self::PowerPort,
        Self::ConsolePort,
        Self::RearPort,
        Self::FrontPort,
    ];

    pub fn collection(self) -> Collection {
        match self {
            Self::Interface => Collection::INTERFACE_TEMPLATES,
            Self::PowerPort => Collection::POWER_PORT_TEMPLATES,
            Self::ConsolePort => Collection::CONSOLE_PORT_TEMPLATES,
            Self::RearPort => Collection::REAR_PORT_TEMPLATES,
            Self::FrontPort => Collection::FRONT_PORT_TEMPLATES,
        }
    }
}

/// A device type plus its component templates. Either the whole thing is
/// kept or the parent is deleted again.
///
/// Component bodies carry no `device_type`; it is filled with the new
/// parent id at create time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceTypeCandidate {
    pub parent: Candidate,
    pub interfaces: Vec<Fields>,
    pub power_ports: Vec<Fields>,
    pub console_ports: Vec<Fields>,
    pub rear_ports: Vec<Fields>,
    pub front_ports: Vec<Fields>,
}

impl DeviceTypeCandidate {
    pub fn model(&self) -> String {
        self.parent
            .get("model")
            .map(super::value_label)
            .unwrap_or_default()
    }

    pub fn components(&self, kind: ComponentKind) -> &[Fields] {
        match kind {
            ComponentKind::Interface => &self.interfaces,
            ComponentKind::PowerPort => &self.power_ports,
            ComponentKind::ConsolePort => &self.console_ports,
            ComponentKind::RearPort => &self.rear_ports,
            ComponentKind::FrontPort => &self.front_ports,
        }
    }
}
