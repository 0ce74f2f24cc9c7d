//! Output cleaning and error-banner classification.

use super::patterns::PromptPattern;

/// Remove command echo and prompt lines from captured output.
///
/// Every line that is a prompt is dropped and leading/trailing blank lines
/// are trimmed. The first line is dropped when it echoes `command` (on its
/// own or behind a prompt), but only while a prompt line is still present:
/// a raw capture always ends at one, cleaned text never has one. That keeps
/// cleaning idempotent even when the body repeats the command.
pub fn clean_output(raw: &str, command: &str, prompt: &PromptPattern) -> String {
    let command = command.trim();
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_matches('\r')).collect();
    let captured = lines.iter().any(|l| prompt.is_prompt_line(l));

    let skip = match lines.first() {
        Some(first) if captured && !command.is_empty() && is_echo(first, command, prompt) => 1,
        _ => 0,
    };

    let kept: Vec<&str> = lines[skip..]
        .iter()
        .copied()
        .filter(|l| !prompt.is_prompt_line(l))
        .collect();
    kept.join("\n").trim_matches('\n').to_string()
}

fn is_echo(line: &str, command: &str, prompt: &PromptPattern) -> bool {
    let line = line.trim_end();
    if line.trim_start() == command {
        return true;
    }
    line.strip_suffix(command)
        .map(|head| prompt.is_prompt_line(head.trim_end()))
        .unwrap_or(false)
}

/// Find the first error substring present in `output`, case-insensitively.
///
/// Substrings are expected in lower case.
pub fn detect_error<'a, I>(output: &str, substrings: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let lowered = output.to_lowercase();
    substrings
        .into_iter()
        .find(|s| !s.is_empty() && lowered.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::tables::DEFAULT_ERROR_SUBSTRINGS;

    const RAW: &str = "display ont info 0/1/1 1\r\n  F/S/P : 0/1/1\r\n  ONT-ID : 1\r\n\r\nMA5800#";

    #[test]
    fn test_strips_echo_and_prompt() {
        let prompt = PromptPattern::generic();
        let cleaned = clean_output(RAW, "display ont info 0/1/1 1", &prompt);
        assert_eq!(cleaned, "  F/S/P : 0/1/1\n  ONT-ID : 1");
    }

    #[test]
    fn test_echo_behind_prompt() {
        let prompt = PromptPattern::generic();
        let raw = "MA5800#display board 0\nslot 1  H901GPHF  Normal\nMA5800#";
        assert_eq!(
            clean_output(raw, "display board 0", &prompt),
            "slot 1  H901GPHF  Normal"
        );
    }

    #[test]
    fn test_first_line_kept_when_not_echo() {
        let prompt = PromptPattern::generic();
        let raw = "  Total: 3\nMA5800#";
        assert_eq!(clean_output(raw, "display ont info summary", &prompt), "  Total: 3");
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let prompt = PromptPattern::generic();
        let command = "display ont info 0/1/1 1";
        let once = clean_output(RAW, command, &prompt);
        let twice = clean_output(&once, command, &prompt);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_body_repeating_command_survives_recleaning() {
        let prompt = PromptPattern::generic();
        let once = clean_output("show hostname\nshow hostname\nOLT#", "show hostname", &prompt);
        assert_eq!(once, "show hostname");
        assert_eq!(clean_output(&once, "show hostname", &prompt), once);
    }

    #[test]
    fn test_detect_error_case_insensitive() {
        let out = "                        ^\n  % Unknown command, the error locates at '^'";
        assert_eq!(
            detect_error(out, DEFAULT_ERROR_SUBSTRINGS.iter().copied()),
            Some("% unknown command")
        );
        assert_eq!(
            detect_error("  ONT-ID : 1", DEFAULT_ERROR_SUBSTRINGS.iter().copied()),
            None
        );
    }
}
