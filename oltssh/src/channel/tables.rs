//! Per-vendor lookup tables consulted by the expect engine.
//!
//! The tables are an explicit, read-only configuration object: build one at
//! startup (usually [`VendorTables::builtin`]), wrap it in an `Arc` and hand
//! it to every engine. Tests build their own with synthetic vendors.

use indexmap::{IndexMap, IndexSet};

use super::patterns::PromptPattern;
use crate::error::{ChannelError, Result};

/// Pager-disable command used when a vendor has no entry.
pub const DEFAULT_PAGER_COMMAND: &str = "terminal length 0";

/// Vendor-agnostic CLI error banners (lower-case).
pub const DEFAULT_ERROR_SUBSTRINGS: &[&str] = &[
    "command not found",
    "% unknown command",
    "% invalid",
    "% incomplete command",
    "syntax error",
    "unrecognized command",
    "bad command",
];

/// Output fragments that mean a referenced ONU/port/profile is absent (lower-case).
pub const DEFAULT_NOT_FOUND_SUBSTRINGS: &[&str] = &[
    "does not exist",
    "not exist",
    "no such",
    "not found",
    "is not configured",
];

// Cisco-like `host#`, `host>`, `host(mode)#`
const CISCO_LIKE_PROMPT: &str = r"[\w.\-]+(?:\([\w.\-/: ]+\))?[#>]";

/// Read-only per-vendor configuration for the expect engine.
#[derive(Debug, Clone)]
pub struct VendorTables {
    prompts: IndexMap<String, PromptPattern>,
    fallback_prompt: PromptPattern,
    pager_commands: IndexMap<String, String>,
    fallback_pager: String,
    error_substrings: Vec<String>,
    vendor_error_substrings: IndexMap<String, Vec<String>>,
    not_found_substrings: Vec<String>,
    escalate_before_pager: IndexSet<String>,
}

impl Default for VendorTables {
    fn default() -> Self {
        Self::generic()
    }
}

impl VendorTables {
    /// Tables with only the generic fallbacks and no vendor entries.
    pub fn generic() -> Self {
        Self {
            prompts: IndexMap::new(),
            fallback_prompt: PromptPattern::generic(),
            pager_commands: IndexMap::new(),
            fallback_pager: DEFAULT_PAGER_COMMAND.to_string(),
            error_substrings: DEFAULT_ERROR_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vendor_error_substrings: IndexMap::new(),
            not_found_substrings: DEFAULT_NOT_FOUND_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            escalate_before_pager: IndexSet::new(),
        }
    }

    /// Tables for the built-in vendors.
    pub fn builtin() -> Self {
        let mut tables = Self::generic();

        tables.insert_prompt(
            "huawei",
            PromptPattern::new(&format!(r"<[\w.\-]+>|{CISCO_LIKE_PROMPT}")),
        );
        tables.insert_prompt("zte", PromptPattern::new(CISCO_LIKE_PROMPT));
        tables.insert_prompt(
            "nokia",
            PromptPattern::new(r"\*?(?:typ|leg):[\w.\-@]+(?:>[\w.\-]+)*>?[#$]"),
        );
        tables.insert_prompt("fiberhome", PromptPattern::new(CISCO_LIKE_PROMPT));
        tables.insert_prompt("vsol", PromptPattern::new(CISCO_LIKE_PROMPT));
        tables.insert_prompt("cdata", PromptPattern::new(CISCO_LIKE_PROMPT));

        tables
            .with_pager_command("huawei", "scroll")
            .with_pager_command("zte", "terminal length 0")
            .with_pager_command("nokia", "environment inhibit-alarms mode batch")
            .with_pager_command("fiberhome", "terminal length 0")
            .with_pager_command("vsol", "terminal length 0")
            .with_pager_command("cdata", "terminal length 0")
            .with_vendor_error_substring("huawei", "failure:")
            .with_vendor_error_substring("huawei", "parameter error")
            .with_vendor_error_substring("zte", "%error")
            .with_vendor_error_substring("nokia", "error : ")
            .with_vendor_error_substring("nokia", "invalid token")
            .with_escalation_before_pager("vsol")
            .with_escalation_before_pager("cdata")
    }

    // Built-in patterns are literals; a compile failure is a bug and is
    // logged rather than taking the process down.
    fn insert_prompt(
        &mut self,
        vendor: &str,
        pattern: std::result::Result<PromptPattern, regex::Error>,
    ) {
        match pattern {
            Ok(p) => {
                self.prompts.insert(vendor.to_string(), p);
            }
            Err(e) => log::error!("built-in prompt for {vendor} failed to compile: {e}"),
        }
    }

    /// Set the prompt pattern for a vendor.
    pub fn with_prompt(mut self, vendor: &str, body: &str) -> Result<Self> {
        let pattern = PromptPattern::new(body).map_err(ChannelError::InvalidPattern)?;
        self.prompts.insert(vendor.to_lowercase(), pattern);
        Ok(self)
    }

    /// Replace the generic fallback prompt.
    pub fn with_fallback_prompt(mut self, body: &str) -> Result<Self> {
        self.fallback_prompt = PromptPattern::new(body).map_err(ChannelError::InvalidPattern)?;
        Ok(self)
    }

    /// Set the pager-disable command for a vendor.
    pub fn with_pager_command(mut self, vendor: &str, command: impl Into<String>) -> Self {
        self.pager_commands.insert(vendor.to_lowercase(), command.into());
        self
    }

    /// Add a vendor-agnostic error substring.
    pub fn with_error_substring(mut self, substring: &str) -> Self {
        self.error_substrings.push(substring.to_lowercase());
        self
    }

    /// Add an error substring that only applies to one vendor.
    pub fn with_vendor_error_substring(mut self, vendor: &str, substring: &str) -> Self {
        self.vendor_error_substrings
            .entry(vendor.to_lowercase())
            .or_default()
            .push(substring.to_lowercase());
        self
    }

    /// Add a "resource not found" substring.
    pub fn with_not_found_substring(mut self, substring: &str) -> Self {
        self.not_found_substrings.push(substring.to_lowercase());
        self
    }

    /// Defer pager suppression for a vendor until after privilege escalation.
    pub fn with_escalation_before_pager(mut self, vendor: &str) -> Self {
        self.escalate_before_pager.insert(vendor.to_lowercase());
        self
    }

    /// Prompt pattern for a vendor, or the generic fallback.
    pub fn prompt_for(&self, vendor: &str) -> &PromptPattern {
        self.prompts
            .get(&vendor.to_lowercase())
            .unwrap_or(&self.fallback_prompt)
    }

    /// Pager-disable command for a vendor, or the generic fallback.
    pub fn pager_command(&self, vendor: &str) -> &str {
        self.pager_commands
            .get(&vendor.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.fallback_pager)
    }

    /// Error substrings that apply to a vendor: the shared list followed by
    /// the vendor's own entries.
    pub fn error_substrings_for<'a>(
        &'a self,
        vendor: &str,
    ) -> impl Iterator<Item = &'a str> + use<'a> {
        self.shared_error_substrings()
            .chain(self.vendor_error_substrings(vendor))
    }

    /// Vendor-agnostic error substrings (syntax and parser errors).
    pub fn shared_error_substrings(&self) -> impl Iterator<Item = &str> {
        self.error_substrings.iter().map(String::as_str)
    }

    /// Error substrings registered for one vendor only.
    pub fn vendor_error_substrings<'a>(
        &'a self,
        vendor: &str,
    ) -> impl Iterator<Item = &'a str> + use<'a> {
        self.vendor_error_substrings
            .get(&vendor.to_lowercase())
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Substrings that indicate a missing resource.
    pub fn not_found_substrings(&self) -> impl Iterator<Item = &str> {
        self.not_found_substrings.iter().map(String::as_str)
    }

    /// Whether pager suppression must wait for privilege escalation.
    pub fn requires_escalation_before_pager(&self, vendor: &str) -> bool {
        self.escalate_before_pager.contains(&vendor.to_lowercase())
    }

    /// Vendors with an explicit prompt entry, in insertion order.
    pub fn vendors(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_for_unknown_vendor() {
        let tables = VendorTables::builtin();
        assert_eq!(tables.pager_command("acme"), "terminal length 0");
        assert_eq!(tables.prompt_for("acme").as_str(), PromptPattern::generic().as_str());
        assert!(!tables.requires_escalation_before_pager("acme"));
    }

    #[test]
    fn test_vendor_lookup_is_case_insensitive() {
        let tables = VendorTables::builtin();
        assert_eq!(tables.pager_command("HUAWEI"), "scroll");
        assert!(tables.requires_escalation_before_pager("VSol"));
        assert!(tables.prompt_for("Huawei").matches_end(b"MA5800(config)#"));
    }

    #[test]
    fn test_nokia_prompt() {
        let tables = VendorTables::builtin();
        let prompt = tables.prompt_for("nokia");
        assert!(prompt.matches_end(b"\ntyp:isadmin>#"));
        assert!(prompt.matches_end(b"\nleg:isadmin>configure>equipment#"));
        assert!(!prompt.matches_end(b"\nMA5800#"));
    }

    #[test]
    fn test_error_substrings_include_vendor_extras() {
        let tables = VendorTables::builtin();
        let huawei: Vec<_> = tables.error_substrings_for("huawei").collect();
        assert!(huawei.contains(&"% unknown command"));
        assert!(huawei.contains(&"failure:"));

        let zte: Vec<_> = tables.error_substrings_for("zte").collect();
        assert!(!zte.contains(&"failure:"));

        assert_eq!(
            tables.vendor_error_substrings("Huawei").collect::<Vec<_>>(),
            vec!["failure:", "parameter error"]
        );
        assert!(!tables.shared_error_substrings().any(|s| s == "failure:"));
        assert_eq!(tables.vendor_error_substrings("acme").count(), 0);
    }

    #[test]
    fn test_synthetic_vendor() {
        let tables = VendorTables::generic()
            .with_prompt("acme", r"acme-[0-9]+\$")
            .unwrap()
            .with_pager_command("ACME", "no page")
            .with_error_substring("NOPE");

        assert!(tables.prompt_for("acme").matches_end(b"acme-7$"));
        assert_eq!(tables.pager_command("acme"), "no page");
        assert!(tables.error_substrings_for("acme").any(|s| s == "nope"));
        assert_eq!(tables.vendors().collect::<Vec<_>>(), vec!["acme"]);
    }

    #[test]
    fn test_invalid_prompt_rejected() {
        assert!(VendorTables::generic().with_prompt("acme", "(").is_err());
    }
}
