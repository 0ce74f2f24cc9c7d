//! Prompt and banner patterns.

use std::fmt;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Generic prompt body: `<host>`, `[host]`, `host#`, `host>`, `host(mode)#`.
pub const GENERIC_PROMPT: &str =
    r"[<\[][\w.\-@/: ]+[>\]]|[\w.\-@/:]+(?:\([\w.\-/: ]*\))?[#>$%]";

/// Username/login banner at the end of output.
pub static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)(?:user\s*name|login)\s*:[ \t]*\z")
        .expect("failed compiling username pattern, this is a bug")
});

/// Password banner at the end of output.
pub static PASSWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)password\s*:[ \t]*\z")
        .expect("failed compiling password pattern, this is a bug")
});

/// In-band pager marker (`---- More ( Press 'Q' to quit ) ----`, `--More--`).
pub static PAGER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)-+ ?more ?(?:\([^)\n]*\))? ?-+[ \t]*\z")
        .expect("failed compiling pager pattern, this is a bug")
});

/// A compiled shell prompt.
///
/// Built from a prompt *body* (no anchors). Two regexes are derived from it:
/// one that matches the body as the last line of the output, used to detect
/// readiness, and one that matches a whole single line, used to drop prompt
/// lines from captured output.
#[derive(Clone)]
pub struct PromptPattern {
    source: String,
    tail: Regex,
    line: Regex,
}

impl PromptPattern {
    /// Compile a prompt body such as `[\w.-]+[#>]`.
    pub fn new(body: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: body.to_string(),
            tail: Regex::new(&format!(r"(?m)^(?:{body})[ \t]*\z"))?,
            line: Regex::new(&format!(r"^(?:{body})[ \t]*$"))?,
        })
    }

    /// The generic fallback prompt.
    pub fn generic() -> Self {
        static GENERIC: Lazy<PromptPattern> = Lazy::new(|| {
            PromptPattern::new(GENERIC_PROMPT)
                .expect("failed compiling generic prompt pattern, this is a bug")
        });
        GENERIC.clone()
    }

    /// The prompt body this pattern was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Regex matching the prompt as the final line of output.
    pub fn tail(&self) -> &Regex {
        &self.tail
    }

    /// Check whether the output ends with this prompt.
    pub fn matches_end(&self, data: &[u8]) -> bool {
        self.tail.is_match(data)
    }

    /// Check whether a single line (without its terminator) is a prompt line.
    pub fn is_prompt_line(&self, line: &str) -> bool {
        self.line.is_match(line.as_bytes())
    }

    /// Extract the trailing prompt text from captured output.
    pub fn find_prompt(&self, data: &[u8]) -> Option<String> {
        self.tail
            .find(data)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string())
    }
}

impl fmt::Debug for PromptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PromptPattern").field(&self.source).finish()
    }
}

/// Which of the raced banner patterns matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerMatch {
    /// The shell prompt; no shell-level login needed.
    Prompt,
    /// A username/login banner.
    Login,
    /// A password banner.
    Password,
}

/// Classify the tail of some output the way the banner race does.
///
/// The prompt wins over a login banner when both could match.
pub fn classify_banner(prompt: &PromptPattern, data: &[u8]) -> Option<BannerMatch> {
    if prompt.matches_end(data) {
        Some(BannerMatch::Prompt)
    } else if USERNAME_PATTERN.is_match(data) {
        Some(BannerMatch::Login)
    } else if PASSWORD_PATTERN.is_match(data) {
        Some(BannerMatch::Password)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_prompt_forms() {
        let prompt = PromptPattern::generic();
        assert!(prompt.matches_end(b"MA5800#"));
        assert!(prompt.matches_end(b"some output\nMA5800#"));
        assert!(prompt.matches_end(b"ZXAN(config)# "));
        assert!(prompt.matches_end(b"OLT>"));
        assert!(prompt.matches_end(b"<HUAWEI>"));
        assert!(prompt.matches_end(b"[AN6000-17]"));
        assert!(!prompt.matches_end(b"MA5800#\nstill printing"));
    }

    #[test]
    fn test_login_banner_is_not_a_prompt() {
        let prompt = PromptPattern::generic();
        assert_eq!(
            classify_banner(&prompt, b"\nWelcome\nUsername:"),
            Some(BannerMatch::Login)
        );
        assert_eq!(classify_banner(&prompt, b"Login: "), Some(BannerMatch::Login));
        assert_eq!(
            classify_banner(&prompt, b"\nPassword:"),
            Some(BannerMatch::Password)
        );
        assert_eq!(classify_banner(&prompt, b"\nMA5800#"), Some(BannerMatch::Prompt));
        assert_eq!(classify_banner(&prompt, b"Connecting..."), None);
    }

    #[test]
    fn test_prompt_line_detection() {
        let prompt = PromptPattern::generic();
        assert!(prompt.is_prompt_line("MA5800(config)#"));
        assert!(!prompt.is_prompt_line("  <cr>"));
        assert!(!prompt.is_prompt_line("  ONT-ID : 1"));
    }

    #[test]
    fn test_find_prompt() {
        let prompt = PromptPattern::new(r"[\w.-]+[#>]").unwrap();
        assert_eq!(
            prompt.find_prompt(b"line\nMA5800# ").as_deref(),
            Some("MA5800#")
        );
        assert!(prompt.find_prompt(b"line\n").is_none());
    }

    #[test]
    fn test_pager_marker() {
        assert!(PAGER_PATTERN.is_match(b"x\n---- More ( Press 'Q' to quit ) ----"));
        assert!(PAGER_PATTERN.is_match(b"x\n--More--"));
        assert!(!PAGER_PATTERN.is_match(b"--More-- \nMA5800#"));
    }

    #[test]
    fn test_invalid_body_is_error() {
        assert!(PromptPattern::new(r"(unclosed").is_err());
    }
}
