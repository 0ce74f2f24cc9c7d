//! Management protocols and port addressing schemes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A management protocol an OLT may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Interactive CLI over SSH.
    Cli,
    Snmp,
    Netconf,
    Rest,
    Gnmi,
}

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Protocol::Cli,
        Protocol::Snmp,
        Protocol::Netconf,
        Protocol::Rest,
        Protocol::Gnmi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Cli => "cli",
            Protocol::Snmp => "snmp",
            Protocol::Netconf => "netconf",
            Protocol::Rest => "rest",
            Protocol::Gnmi => "gnmi",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    /// Case-insensitive; `ssh` is an alias for `cli`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" | "ssh" => Ok(Protocol::Cli),
            "snmp" => Ok(Protocol::Snmp),
            "netconf" => Ok(Protocol::Netconf),
            "rest" => Ok(Protocol::Rest),
            "gnmi" => Ok(Protocol::Gnmi),
            other => Err(Error::validation(
                "protocol",
                format!("unknown protocol '{other}'"),
            )),
        }
    }
}

/// Which management protocols are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSupport {
    pub cli: bool,
    pub snmp: bool,
    pub netconf: bool,
    pub rest: bool,
    pub gnmi: bool,
}

impl ProtocolSupport {
    /// CLI only; what every supported OLT offers.
    pub fn cli_only() -> Self {
        Self {
            cli: true,
            ..Self::default()
        }
    }

    /// Enable one more protocol.
    pub fn with(mut self, protocol: Protocol) -> Self {
        *self.flag_mut(protocol) = true;
        self
    }

    pub fn supports(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Cli => self.cli,
            Protocol::Snmp => self.snmp,
            Protocol::Netconf => self.netconf,
            Protocol::Rest => self.rest,
            Protocol::Gnmi => self.gnmi,
        }
    }

    /// Enabled protocols in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = Protocol> + '_ {
        Protocol::ALL.into_iter().filter(|p| self.supports(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none()
    }

    fn flag_mut(&mut self, protocol: Protocol) -> &mut bool {
        match protocol {
            Protocol::Cli => &mut self.cli,
            Protocol::Snmp => &mut self.snmp,
            Protocol::Netconf => &mut self.netconf,
            Protocol::Rest => &mut self.rest,
            Protocol::Gnmi => &mut self.gnmi,
        }
    }
}

impl FromIterator<Protocol> for ProtocolSupport {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

/// How a vendor names PON ports in CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortNaming {
    /// `frame/slot/port`, e.g. `0/1/1`.
    #[default]
    FrameSlotPort,
    /// `gpon-olt_rack/slot/port`, e.g. `gpon-olt_1/2/1`.
    GponOlt,
    /// `rack/shelf/slot/port` with a single shelf, e.g. `1/1/4/1`.
    RackShelfSlotPort,
    /// `slot/port` on single-chassis boxes, e.g. `0/3`.
    SlotPort,
}

impl PortNaming {
    /// Render a PON port identifier.
    ///
    /// `frame` is the frame or rack number; schemes without one ignore it.
    pub fn format_port(self, frame: u32, slot: u32, port: u32) -> String {
        match self {
            PortNaming::FrameSlotPort => format!("{frame}/{slot}/{port}"),
            PortNaming::GponOlt => format!("gpon-olt_{frame}/{slot}/{port}"),
            PortNaming::RackShelfSlotPort => format!("{frame}/1/{slot}/{port}"),
            PortNaming::SlotPort => format!("{slot}/{port}"),
        }
    }
}
