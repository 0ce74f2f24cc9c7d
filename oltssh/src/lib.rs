//! # oltssh
//!
//! Async terminal automation for multi-vendor OLTs over SSH.
//!
//! OLTs from Huawei, ZTE, Nokia, FiberHome, V-SOL and C-Data mostly expose
//! an interactive CLI and little else. oltssh drives that CLI reliably and
//! tells callers up front what a given vendor/model can do.
//!
//! ## Features
//!
//! - Async SSH connections via russh, PTY shell with local echo disabled
//! - Expect engine with shell-level login, pager handling and
//!   tail-only prompt search (scrapli-style pattern buffer)
//! - Output cleaning and CLI error-banner classification
//! - Capability matrix with Full / ReadOnly / Minimal presets
//! - Driver registry with deterministic capability resolution
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oltssh::{DriverFactory, OltDriver, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), oltssh::Error> {
//!     let config = SessionConfig::builder("10.10.0.2")
//!         .username("admin")
//!         .secret("admin123")
//!         .vendor("huawei")
//!         .build()?;
//!
//!     let driver = DriverFactory::global().create_driver(config, "MA5800-X17")?;
//!     driver.connect().await?;
//!
//!     let response = driver.execute("display board 0").await?;
//!     println!("{}", response.result);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod channel;
pub mod device;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod registry;
pub mod transport;

// Re-export main types for convenience
pub use capability::{Capabilities, Operation, Protocol};
pub use channel::{ExpectEngine, PromptPattern, ShellState, VendorTables};
pub use device::DeviceProfile;
pub use diagnostics::{OpticalStatus, OpticalThresholds};
pub use driver::{BatchOptions, BatchResult, GenericOltDriver, OltDriver, Response, Session};
pub use error::{Error, ErrorKind, Result};
pub use registry::{DriverConstructor, DriverFactory};
pub use transport::{HostKeyVerification, SessionConfig, SessionConfigBuilder};
