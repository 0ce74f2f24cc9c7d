//! Driver registry: vendor name to constructor, plus capability resolution.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use once_cell::sync::Lazy;

use crate::capability::{BUILTIN_VENDORS, Capabilities, builtin_capabilities};
use crate::driver::{GenericOltDriver, OltDriver};
use crate::error::{PlatformError, Result};
use crate::transport::SessionConfig;

/// Builds a driver for one device.
pub type DriverConstructor =
    Arc<dyn Fn(SessionConfig, Capabilities) -> Result<Box<dyn OltDriver>> + Send + Sync>;

/// Process-wide factory.
static GLOBAL: Lazy<DriverFactory> = Lazy::new(DriverFactory::with_builtin_drivers);

/// Registry of driver constructors and capability overrides.
///
/// Keys are lower-cased. Registration and lookup may happen from any
/// thread; lookups never touch the network.
pub struct DriverFactory {
    drivers: RwLock<HashMap<String, DriverConstructor>>,
    capabilities: RwLock<HashMap<String, Capabilities>>,
}

impl Default for DriverFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
            capabilities: RwLock::new(HashMap::new()),
        }
    }

    /// Create a factory with the generic driver registered for every
    /// built-in vendor.
    pub fn with_builtin_drivers() -> Self {
        let factory = Self::new();
        for vendor in BUILTIN_VENDORS {
            factory.register_driver(vendor, |config, caps| {
                Ok(Box::new(GenericOltDriver::new(config, caps)) as Box<dyn OltDriver>)
            });
        }
        factory
    }

    /// The process-wide factory.
    ///
    /// Built on first use with the built-in vendors. Custom drivers and
    /// capability overrides must be registered before the first
    /// `create_driver` or `get_capabilities` call that depends on them.
    pub fn global() -> &'static DriverFactory {
        &GLOBAL
    }

    /// Register a constructor for a vendor. A later registration for the
    /// same vendor replaces the earlier one.
    pub fn register_driver<F>(&self, vendor: &str, constructor: F)
    where
        F: Fn(SessionConfig, Capabilities) -> Result<Box<dyn OltDriver>> + Send + Sync + 'static,
    {
        let key = vendor.trim().to_lowercase();
        debug!("registering driver for {}", key);
        self.drivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(constructor));
    }

    /// Register a capability override for an exact vendor/model. An empty
    /// model registers the vendor-level default.
    pub fn register_model_capabilities(&self, vendor: &str, model: &str, caps: Capabilities) {
        let key = capability_key(vendor, model);
        debug!("registering capabilities for '{}'", key);
        self.capabilities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, caps);
    }

    /// Build a driver for `config.vendor` with the resolved capabilities.
    ///
    /// Nothing is dialed; call `connect` on the result.
    pub fn create_driver(&self, config: SessionConfig, model: &str) -> Result<Box<dyn OltDriver>> {
        let constructor = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&config.vendor.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| PlatformError::UnsupportedVendor {
                vendor: config.vendor.clone(),
            })?;

        let caps = self.get_capabilities(&config.vendor, model);
        constructor(config, caps)
    }

    /// Resolve capabilities: exact override, then vendor default, then the
    /// built-in model heuristic, then the minimal preset.
    pub fn get_capabilities(&self, vendor: &str, model: &str) -> Capabilities {
        {
            let overrides = self
                .capabilities
                .read()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(caps) = overrides.get(&capability_key(vendor, model)) {
                return caps.clone();
            }
            if let Some(caps) = overrides.get(&capability_key(vendor, "")) {
                return caps.clone().for_device(vendor.trim().to_lowercase(), model);
            }
        }

        builtin_capabilities(vendor, model)
            .unwrap_or_else(|| Capabilities::minimal(vendor.trim().to_lowercase(), model))
    }

    /// Registered vendors, sorted.
    pub fn supported_vendors(&self) -> Vec<String> {
        let mut vendors: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        vendors.sort();
        vendors
    }

    pub fn is_vendor_supported(&self, vendor: &str) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&vendor.trim().to_lowercase())
    }
}

fn capability_key(vendor: &str, model: &str) -> String {
    format!("{}:{}", vendor.trim(), model.trim()).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PortNaming;
    use crate::error::ErrorKind;

    fn config(vendor: &str) -> SessionConfig {
        SessionConfig::builder("olt-test")
            .username("admin")
            .secret("secret")
            .vendor(vendor)
            .build()
            .unwrap()
    }

    #[test]
    fn test_override_beats_vendor_default() {
        let factory = DriverFactory::new();
        let exact = Capabilities::read_only("custom", "X100").with_pon_ports(4);
        factory.register_model_capabilities("custom", "X100", exact.clone());
        factory.register_model_capabilities("Custom", "", Capabilities::full("custom", ""));

        assert_eq!(factory.get_capabilities("custom", "X100"), exact);
        assert_eq!(factory.get_capabilities("CUSTOM", "x100"), exact);
    }

    #[test]
    fn test_unknown_model_falls_back_to_minimal() {
        let factory = DriverFactory::new();
        factory.register_model_capabilities(
            "custom",
            "X100",
            Capabilities::full("custom", "X100"),
        );

        let caps = factory.get_capabilities("custom", "Y200");
        assert_eq!(caps, Capabilities::minimal("custom", "Y200"));
    }

    #[test]
    fn test_vendor_default_used_for_any_model() {
        let factory = DriverFactory::new();
        factory.register_model_capabilities(
            "custom",
            "",
            Capabilities::full("custom", "").with_port_naming(PortNaming::SlotPort),
        );

        let caps = factory.get_capabilities("custom", "Z9");
        assert_eq!(caps.port_naming, PortNaming::SlotPort);
        assert_eq!(caps.model, "Z9");
    }

    #[test]
    fn test_builtin_heuristic_before_minimal() {
        let factory = DriverFactory::new();
        let caps = factory.get_capabilities("huawei", "MA5800-X7");
        assert!(caps.can_manage_onu());
        assert_eq!(caps.max_onus_per_port, 128);
    }

    #[test]
    fn test_register_last_wins() {
        let factory = DriverFactory::new();
        factory.register_driver("acme", |_, _| {
            Err(PlatformError::InvalidDefinition {
                message: "first".into(),
            }
            .into())
        });
        factory.register_driver("ACME", |config, caps| {
            Ok(Box::new(GenericOltDriver::new(config, caps)) as Box<dyn OltDriver>)
        });

        let driver = factory.create_driver(config("acme"), "A1").unwrap();
        assert_eq!(driver.vendor(), "acme");
        assert_eq!(driver.model(), "A1");
        assert_eq!(factory.supported_vendors(), vec!["acme".to_string()]);
    }

    #[test]
    fn test_unsupported_vendor() {
        let factory = DriverFactory::new();
        let err = factory.create_driver(config("acme"), "A1").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.to_string().contains("acme"));
    }

    #[test]
    fn test_builtin_factory() {
        let factory = DriverFactory::with_builtin_drivers();
        assert_eq!(
            factory.supported_vendors(),
            vec!["cdata", "fiberhome", "huawei", "nokia", "vsol", "zte"]
        );
        assert!(factory.is_vendor_supported("ZTE"));
        assert!(!factory.is_vendor_supported("acme"));

        let driver = factory.create_driver(config("nokia"), "FX-8").unwrap();
        assert!(driver.capabilities().has_protocol("netconf"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(DriverFactory::global(), DriverFactory::global()));
        assert!(DriverFactory::global().is_vendor_supported("huawei"));
    }
}
