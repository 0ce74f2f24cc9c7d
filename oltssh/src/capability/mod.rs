//! Capability model: which operations a vendor/model supports.
//!
//! A [`Capabilities`] value is a flat feature matrix plus a little
//! addressing metadata. It answers "can this OLT do X" without touching
//! the device, so callers can degrade gracefully instead of sending a
//! command that is bound to fail. Values are immutable once built and are
//! shared by clone.
//!
//! # Example
//!
//! ```rust
//! use oltssh::capability::{Capabilities, Operation, PortNaming, Protocol, ProtocolSupport};
//!
//! let caps = Capabilities::full("zte", "C600")
//!     .with_port_naming(PortNaming::GponOlt)
//!     .with_protocols(ProtocolSupport::cli_only().with(Protocol::Snmp))
//!     .with_operation(Operation::VlanTranslation, false);
//!
//! assert!(caps.can_manage_onu());
//! assert!(caps.has_protocol("ssh"));
//! assert!(caps.require(Operation::VlanTranslation).is_err());
//! ```

mod builtin;
mod operation;
mod protocol;

pub use builtin::{BUILTIN_VENDORS, builtin_capabilities};
pub use operation::Operation;
pub use protocol::{PortNaming, Protocol, ProtocolSupport};

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Error, Result};

/// Feature matrix for one vendor/model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub vendor: String,
    pub model: String,

    pub onu_provision: bool,
    pub onu_delete: bool,
    pub onu_reboot: bool,
    pub onu_info: bool,

    pub port_list: bool,
    pub port_control: bool,

    pub vlan: bool,
    pub vlan_translation: bool,

    pub line_profiles: bool,
    pub service_profiles: bool,
    pub traffic_profiles: bool,
    pub dba_profiles: bool,

    pub batch_provision: bool,
    pub batch_vlan: bool,

    pub config_export: bool,
    pub diagnostics: bool,
    pub optical_diagnostics: bool,
    pub performance_counters: bool,

    /// Management protocols the device exposes.
    pub protocols: ProtocolSupport,

    /// PON port naming scheme.
    pub port_naming: PortNaming,

    /// ONUs per PON port.
    pub max_onus_per_port: u32,

    /// Number of PON ports.
    pub pon_ports: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::minimal("", "")
    }
}

impl Capabilities {
    /// Everything supported.
    pub fn full(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            onu_provision: true,
            onu_delete: true,
            onu_reboot: true,
            onu_info: true,
            port_list: true,
            port_control: true,
            vlan: true,
            vlan_translation: true,
            line_profiles: true,
            service_profiles: true,
            traffic_profiles: true,
            dba_profiles: true,
            batch_provision: true,
            batch_vlan: true,
            config_export: true,
            diagnostics: true,
            optical_diagnostics: true,
            performance_counters: true,
            protocols: ProtocolSupport::cli_only().with(Protocol::Snmp),
            port_naming: PortNaming::FrameSlotPort,
            max_onus_per_port: 128,
            pon_ports: 16,
        }
    }

    /// Inspection only: nothing that changes ONU or port state.
    pub fn read_only(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            onu_provision: false,
            onu_delete: false,
            onu_reboot: false,
            port_control: false,
            vlan: false,
            vlan_translation: false,
            line_profiles: false,
            service_profiles: false,
            traffic_profiles: false,
            dba_profiles: false,
            batch_provision: false,
            batch_vlan: false,
            ..Self::full(vendor, model)
        }
    }

    /// Conservative fallback for unknown vendors: single-ONU provisioning
    /// and inspection over CLI, nothing else.
    pub fn minimal(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            onu_provision: true,
            onu_delete: true,
            onu_reboot: false,
            onu_info: true,
            port_list: true,
            port_control: false,
            vlan: false,
            vlan_translation: false,
            line_profiles: false,
            service_profiles: false,
            traffic_profiles: false,
            dba_profiles: false,
            batch_provision: false,
            batch_vlan: false,
            config_export: false,
            diagnostics: false,
            optical_diagnostics: false,
            performance_counters: false,
            protocols: ProtocolSupport::cli_only(),
            port_naming: PortNaming::FrameSlotPort,
            max_onus_per_port: 64,
            pon_ports: 8,
        }
    }

    /// Re-label a matrix for another vendor/model.
    pub fn for_device(mut self, vendor: impl Into<String>, model: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self.model = model.into();
        self
    }

    pub fn with_protocols(mut self, protocols: ProtocolSupport) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_port_naming(mut self, naming: PortNaming) -> Self {
        self.port_naming = naming;
        self
    }

    pub fn with_max_onus_per_port(mut self, max: u32) -> Self {
        self.max_onus_per_port = max;
        self
    }

    pub fn with_pon_ports(mut self, ports: u32) -> Self {
        self.pon_ports = ports;
        self
    }

    /// Turn one operation flag on or off.
    pub fn with_operation(mut self, op: Operation, enabled: bool) -> Self {
        *self.flag_mut(op) = enabled;
        self
    }

    pub fn can_provision_onu(&self) -> bool {
        self.onu_provision && self.onu_delete
    }

    pub fn can_manage_onu(&self) -> bool {
        self.onu_provision && self.onu_delete && self.onu_reboot && self.onu_info
    }

    pub fn can_manage_ports(&self) -> bool {
        self.port_list && self.port_control
    }

    pub fn can_manage_vlan(&self) -> bool {
        self.vlan
    }

    pub fn can_manage_profiles(&self) -> bool {
        self.line_profiles || self.service_profiles || self.traffic_profiles
    }

    pub fn can_batch_provision(&self) -> bool {
        self.batch_provision && self.onu_provision
    }

    pub fn can_run_diagnostics(&self) -> bool {
        self.diagnostics || self.optical_diagnostics
    }

    /// No operation that changes ONU or port state.
    pub fn is_read_only(&self) -> bool {
        !self.onu_provision && !self.onu_delete && !self.onu_reboot && !self.port_control
    }

    /// Protocol availability by name; `ssh` is an alias for `cli`, unknown
    /// names are never available.
    pub fn has_protocol(&self, name: &str) -> bool {
        name.parse::<Protocol>()
            .map(|p| self.protocols.supports(p))
            .unwrap_or(false)
    }

    /// Whether `op` can be attempted.
    ///
    /// Batch provisioning additionally needs single-ONU provisioning.
    pub fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::BatchProvision => self.can_batch_provision(),
            _ => self.flag(op),
        }
    }

    /// Fail with an unsupported-operation error unless `op` is supported.
    pub fn require(&self, op: Operation) -> Result<()> {
        if self.supports(op) {
            Ok(())
        } else {
            Err(self.unsupported(op, None))
        }
    }

    /// Build the unsupported-operation error for this device.
    pub fn unsupported(&self, op: Operation, reason: Option<String>) -> Error {
        DriverError::Unsupported {
            vendor: self.vendor.clone(),
            model: self.model.clone(),
            operation: op.to_string(),
            reason,
        }
        .into()
    }

    /// Supported operations in declaration order.
    pub fn supported_operations(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.supports(*op))
    }

    fn flag(&self, op: Operation) -> bool {
        match op {
            Operation::ProvisionOnu => self.onu_provision,
            Operation::DeleteOnu => self.onu_delete,
            Operation::RebootOnu => self.onu_reboot,
            Operation::OnuInfo => self.onu_info,
            Operation::ListPorts => self.port_list,
            Operation::ControlPort => self.port_control,
            Operation::Vlan => self.vlan,
            Operation::VlanTranslation => self.vlan_translation,
            Operation::LineProfiles => self.line_profiles,
            Operation::ServiceProfiles => self.service_profiles,
            Operation::TrafficProfiles => self.traffic_profiles,
            Operation::DbaProfiles => self.dba_profiles,
            Operation::BatchProvision => self.batch_provision,
            Operation::BatchVlan => self.batch_vlan,
            Operation::ConfigExport => self.config_export,
            Operation::Diagnostics => self.diagnostics,
            Operation::OpticalDiagnostics => self.optical_diagnostics,
            Operation::PerformanceCounters => self.performance_counters,
        }
    }

    fn flag_mut(&mut self, op: Operation) -> &mut bool {
        match op {
            Operation::ProvisionOnu => &mut self.onu_provision,
            Operation::DeleteOnu => &mut self.onu_delete,
            Operation::RebootOnu => &mut self.onu_reboot,
            Operation::OnuInfo => &mut self.onu_info,
            Operation::ListPorts => &mut self.port_list,
            Operation::ControlPort => &mut self.port_control,
            Operation::Vlan => &mut self.vlan,
            Operation::VlanTranslation => &mut self.vlan_translation,
            Operation::LineProfiles => &mut self.line_profiles,
            Operation::ServiceProfiles => &mut self.service_profiles,
            Operation::TrafficProfiles => &mut self.traffic_profiles,
            Operation::DbaProfiles => &mut self.dba_profiles,
            Operation::BatchProvision => &mut self.batch_provision,
            Operation::BatchVlan => &mut self.batch_vlan,
            Operation::ConfigExport => &mut self.config_export,
            Operation::Diagnostics => &mut self.diagnostics,
            Operation::OpticalDiagnostics => &mut self.optical_diagnostics,
            Operation::PerformanceCounters => &mut self.performance_counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn manage_onu_by_flags(c: &Capabilities) -> bool {
        c.onu_provision && c.onu_delete && c.onu_reboot && c.onu_info
    }

    #[test]
    fn test_presets_manage_onu_consistency() {
        for caps in [
            Capabilities::full("huawei", "MA5800-X17"),
            Capabilities::read_only("huawei", "MA5800-X17"),
            Capabilities::minimal("acme", "X1"),
        ] {
            assert_eq!(caps.can_manage_onu(), manage_onu_by_flags(&caps));
        }

        let minimal = Capabilities::minimal("acme", "X1");
        assert!(minimal.onu_provision && minimal.onu_delete && minimal.onu_info);
        assert!(!minimal.onu_reboot);
        assert!(!minimal.can_manage_onu());
        assert!(minimal.can_provision_onu());
    }

    #[test]
    fn test_read_only_preset() {
        let caps = Capabilities::read_only("zte", "C320");
        assert!(caps.is_read_only());
        assert!(caps.can_run_diagnostics());
        assert!(!caps.can_manage_profiles());
        assert!(!Capabilities::full("zte", "C320").is_read_only());
    }

    #[test]
    fn test_derived_predicates() {
        let caps = Capabilities::minimal("acme", "X1")
            .with_operation(Operation::BatchProvision, true)
            .with_operation(Operation::TrafficProfiles, true)
            .with_operation(Operation::OpticalDiagnostics, true);
        assert!(caps.can_batch_provision());
        assert!(caps.can_manage_profiles());
        assert!(caps.can_run_diagnostics());
        assert!(!caps.can_manage_ports());

        let caps = caps.with_operation(Operation::ProvisionOnu, false);
        assert!(!caps.can_batch_provision());
        assert!(!caps.supports(Operation::BatchProvision));
    }

    #[test]
    fn test_has_protocol_alias() {
        let presets = [
            Capabilities::full("nokia", "FX-16"),
            Capabilities::minimal("acme", "X1").with_protocols(ProtocolSupport::default()),
            Capabilities::minimal("acme", "X1")
                .with_protocols(ProtocolSupport::default().with(Protocol::Netconf)),
        ];
        for caps in presets {
            assert_eq!(caps.has_protocol("ssh"), caps.has_protocol("cli"));
            assert!(!caps.has_protocol("unknown-token"));
        }
    }

    #[test]
    fn test_require_unsupported() {
        let caps = Capabilities::minimal("vsol", "V1600D");
        assert!(caps.require(Operation::OnuInfo).is_ok());

        let err = caps.require(Operation::RebootOnu).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("reboot_onu"));
        assert!(err.to_string().contains("V1600D"));
    }

    #[test]
    fn test_supported_operations() {
        let ops: Vec<_> = Capabilities::minimal("acme", "X1")
            .supported_operations()
            .collect();
        assert_eq!(
            ops,
            vec![
                Operation::ProvisionOnu,
                Operation::DeleteOnu,
                Operation::OnuInfo,
                Operation::ListPorts
            ]
        );
    }

    #[test]
    fn test_override_file_round_trip() {
        let json = r#"{
            "vendor": "custom",
            "model": "X100",
            "onu_reboot": true,
            "protocols": { "cli": true, "netconf": true },
            "port_naming": "rack_shelf_slot_port",
            "max_onus_per_port": 256
        }"#;
        let caps: Capabilities = serde_json::from_str(json).unwrap();
        assert_eq!(caps.model, "X100");
        // absent fields come from the minimal preset
        assert!(caps.onu_reboot);
        assert!(caps.onu_provision);
        assert!(!caps.vlan);
        assert!(caps.has_protocol("netconf"));
        assert_eq!(caps.port_naming, PortNaming::RackShelfSlotPort);
        assert_eq!(caps.max_onus_per_port, 256);
        assert_eq!(caps.pon_ports, 8);
    }
}
