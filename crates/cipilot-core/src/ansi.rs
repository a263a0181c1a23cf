//! Terminal escape-sequence stripping for captured tool output.

use regex::Regex;
use std::sync::OnceLock;

fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Two-byte Fe escapes, or CSI sequences (params, intermediates, final byte).
        Regex::new(r"\x1b(?:[@-_]|\[[0-?]*[ -/]*[@-~])").expect("static ANSI pattern compiles")
    })
}

/// Remove ANSI color and cursor control sequences from `text`.
pub fn strip_ansi(text: &str) -> String {
    ansi_pattern().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        let colored = "\x1b[31mFAILED\x1b[0m src/app/calc.component.spec.ts";
        assert_eq!(strip_ansi(colored), "FAILED src/app/calc.component.spec.ts");
    }

    #[test]
    fn strips_cursor_movement_and_bold() {
        let text = "\x1b[1m\x1b[2KChrome Headless\x1b[22m";
        assert_eq!(strip_ansi(text), "Chrome Headless");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        let text = "Executed 3 of 3 SUCCESS (0.12 secs)";
        assert_eq!(strip_ansi(text), text);
    }
}
