//! Operation families a driver may or may not support.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One family of operations gated by the capability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ProvisionOnu,
    DeleteOnu,
    RebootOnu,
    OnuInfo,
    ListPorts,
    ControlPort,
    Vlan,
    VlanTranslation,
    LineProfiles,
    ServiceProfiles,
    TrafficProfiles,
    DbaProfiles,
    BatchProvision,
    BatchVlan,
    ConfigExport,
    Diagnostics,
    OpticalDiagnostics,
    PerformanceCounters,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::ProvisionOnu,
        Operation::DeleteOnu,
        Operation::RebootOnu,
        Operation::OnuInfo,
        Operation::ListPorts,
        Operation::ControlPort,
        Operation::Vlan,
        Operation::VlanTranslation,
        Operation::LineProfiles,
        Operation::ServiceProfiles,
        Operation::TrafficProfiles,
        Operation::DbaProfiles,
        Operation::BatchProvision,
        Operation::BatchVlan,
        Operation::ConfigExport,
        Operation::Diagnostics,
        Operation::OpticalDiagnostics,
        Operation::PerformanceCounters,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ProvisionOnu => "provision_onu",
            Operation::DeleteOnu => "delete_onu",
            Operation::RebootOnu => "reboot_onu",
            Operation::OnuInfo => "onu_info",
            Operation::ListPorts => "list_ports",
            Operation::ControlPort => "control_port",
            Operation::Vlan => "vlan",
            Operation::VlanTranslation => "vlan_translation",
            Operation::LineProfiles => "line_profiles",
            Operation::ServiceProfiles => "service_profiles",
            Operation::TrafficProfiles => "traffic_profiles",
            Operation::DbaProfiles => "dba_profiles",
            Operation::BatchProvision => "batch_provision",
            Operation::BatchVlan => "batch_vlan",
            Operation::ConfigExport => "config_export",
            Operation::Diagnostics => "diagnostics",
            Operation::OpticalDiagnostics => "optical_diagnostics",
            Operation::PerformanceCounters => "performance_counters",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
