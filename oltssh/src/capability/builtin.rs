//! Built-in capability defaults for known vendors, picked by model prefix.

use super::{Capabilities, Operation, PortNaming, Protocol, ProtocolSupport};

/// Vendors with built-in defaults.
pub const BUILTIN_VENDORS: &[&str] = &["cdata", "fiberhome", "huawei", "nokia", "vsol", "zte"];

/// Default matrix for a known vendor, refined by model family.
///
/// Returns `None` for vendors without built-in knowledge.
pub fn builtin_capabilities(vendor: &str, model: &str) -> Option<Capabilities> {
    let vendor = vendor.trim().to_lowercase();
    let family = model.trim().to_uppercase();

    let caps = match vendor.as_str() {
        "huawei" => {
            let caps = Capabilities::full(&vendor, model);
            if family.starts_with("MA5800") {
                caps.with_pon_ports(16).with_max_onus_per_port(128)
            } else {
                // MA5600T / MA5608T / MA5683T chassis
                caps.with_pon_ports(16).with_max_onus_per_port(64)
            }
        }
        "zte" => {
            let caps = Capabilities::full(&vendor, model).with_port_naming(PortNaming::GponOlt);
            if family.starts_with("C6") {
                caps.with_pon_ports(16)
                    .with_max_onus_per_port(128)
                    .with_protocols(
                        ProtocolSupport::cli_only()
                            .with(Protocol::Snmp)
                            .with(Protocol::Netconf),
                    )
            } else if family.starts_with("C320") {
                caps.with_pon_ports(8).with_max_onus_per_port(64)
            } else {
                caps.with_pon_ports(16).with_max_onus_per_port(64)
            }
        }
        "nokia" => Capabilities::full(&vendor, model)
            .with_port_naming(PortNaming::RackShelfSlotPort)
            .with_protocols(
                ProtocolSupport::cli_only()
                    .with(Protocol::Snmp)
                    .with(Protocol::Netconf),
            )
            .with_pon_ports(16)
            .with_max_onus_per_port(128),
        "fiberhome" => {
            let caps = Capabilities::full(&vendor, model);
            if family.starts_with("AN6000") {
                caps.with_pon_ports(16).with_max_onus_per_port(128)
            } else {
                // AN5516 and older
                caps.with_pon_ports(16)
                    .with_max_onus_per_port(64)
                    .with_operation(Operation::VlanTranslation, false)
            }
        }
        "vsol" => {
            let caps = Capabilities::full(&vendor, model)
                .with_port_naming(PortNaming::SlotPort)
                .with_operation(Operation::BatchVlan, false)
                .with_operation(Operation::PerformanceCounters, false);
            if family.starts_with("V1600G") {
                caps.with_pon_ports(8).with_max_onus_per_port(128)
            } else {
                caps.with_pon_ports(4).with_max_onus_per_port(64)
            }
        }
        "cdata" => {
            let caps = Capabilities::full(&vendor, model)
                .with_port_naming(PortNaming::SlotPort)
                .with_operation(Operation::VlanTranslation, false);
            if family.starts_with("FD16") {
                caps.with_pon_ports(16).with_max_onus_per_port(128)
            } else {
                caps.with_pon_ports(8).with_max_onus_per_port(64)
            }
        }
        _ => return None,
    };

    Some(caps)
}
