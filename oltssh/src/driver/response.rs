//! Cleaned output of one command.

use std::fmt;
use std::time::Duration;

/// What the device printed for one command.
#[derive(Debug, Clone)]
pub struct Response {
    pub command: String,

    /// Output with the echoed command and prompt lines removed.
    pub result: String,

    /// Everything read between sending the command and the prompt, ANSI
    /// sequences and pager markers already stripped.
    pub raw_result: String,

    /// Prompt text that ended the read, e.g. `MA5800-X17(config)#`.
    pub prompt: String,

    pub elapsed: Duration,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.result.contains(needle)
    }

    /// True when the device printed nothing besides the echo and prompt.
    pub fn is_empty(&self) -> bool {
        self.result.trim().is_empty()
    }

    /// Value of the first `key : value` line whose key matches, ignoring
    /// case and surrounding padding.
    ///
    /// Most OLT detail views (`display ont info`, `show gpon onu detail-info`)
    /// print one field per line in this form.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(key).then(|| v.trim())
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ont_info() -> Response {
        Response::new(
            "display ont info 0/1/1 1",
            "  F/S/P                   : 0/1/1\n  ONT-ID                  : 1\n  Run state               : online\n  Memory occupation       : 48%",
            "display ont info 0/1/1 1\n  F/S/P : 0/1/1\nMA5800#",
            "MA5800#",
            Duration::from_millis(120),
        )
    }

    #[test]
    fn test_lines_and_contains() {
        let resp = ont_info();
        assert_eq!(resp.lines().count(), 4);
        assert!(resp.contains("online"));
        assert!(!resp.is_empty());
        assert_eq!(resp.to_string(), resp.result);
    }

    #[test]
    fn test_field_lookup() {
        let resp = ont_info();
        assert_eq!(resp.field("run state"), Some("online"));
        assert_eq!(resp.field("F/S/P"), Some("0/1/1"));
        assert_eq!(resp.field("Memory occupation"), Some("48%"));
        assert_eq!(resp.field("SN"), None);
    }
}
