//! CI stage definitions and the command forms emitted for them.

/// Builtin CI stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinStage {
    /// npm test, selectable per spec file
    Test,

    /// npm run lint / npx eslint, selectable per source file
    Lint,
}

impl BuiltinStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStage::Test => "test",
            BuiltinStage::Lint => "lint",
        }
    }

    /// Command that runs the stage over the whole project.
    pub fn full_command(&self) -> &'static str {
        match self {
            BuiltinStage::Test => "npm test",
            BuiltinStage::Lint => "npm run lint",
        }
    }

    /// Command that runs the stage over specific paths.
    pub fn targeted_command(&self, paths: &[String]) -> String {
        match self {
            BuiltinStage::Test => format!("npm test -- {}", paths.join(" ")),
            BuiltinStage::Lint => format!("npx eslint {}", paths.join(" ")),
        }
    }

    /// Command emitted when the stage has nothing to do.
    pub fn noop_command(&self) -> &'static str {
        match self {
            BuiltinStage::Test => "echo 'No tests required'",
            BuiltinStage::Lint => "echo 'No files to lint'",
        }
    }
}

/// Configuration for a command the fix loop executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,
}

impl StageConfig {
    /// The project's unit-test command in CI mode.
    pub fn unit_tests() -> Self {
        Self::custom(
            "unit_tests".to_string(),
            vec!["npm".to_string(), "run".to_string(), "test".to_string()],
            0,
        )
    }

    /// Create a custom stage configuration.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            timeout_secs,
        }
    }

    /// Build a stage from a whitespace-separated command line.
    pub fn from_command_line(name: &str, line: &str, timeout_secs: u64) -> Self {
        Self::custom(
            name.to_string(),
            line.split_whitespace().map(str::to_string).collect(),
            timeout_secs,
        )
    }

    /// Command rendered for logs.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_stage_names() {
        assert_eq!(BuiltinStage::Test.name(), "test");
        assert_eq!(BuiltinStage::Lint.name(), "lint");
    }

    #[test]
    fn test_full_commands() {
        assert_eq!(BuiltinStage::Test.full_command(), "npm test");
        assert_eq!(BuiltinStage::Lint.full_command(), "npm run lint");
    }

    #[test]
    fn test_targeted_commands_join_paths() {
        let paths = vec!["src/a.ts".to_string(), "src/b.ts".to_string()];
        assert_eq!(
            BuiltinStage::Lint.targeted_command(&paths),
            "npx eslint src/a.ts src/b.ts"
        );
        assert_eq!(
            BuiltinStage::Test.targeted_command(&paths),
            "npm test -- src/a.ts src/b.ts"
        );
    }

    #[test]
    fn test_noop_commands() {
        assert_eq!(BuiltinStage::Lint.noop_command(), "echo 'No files to lint'");
        assert_eq!(BuiltinStage::Test.noop_command(), "echo 'No tests required'");
    }

    #[test]
    fn test_unit_tests_stage() {
        let config = StageConfig::unit_tests();
        assert_eq!(config.display_command(), "npm run test");
        assert_eq!(config.timeout_secs, 0);
    }

    #[test]
    fn test_from_command_line_splits_whitespace() {
        let config = StageConfig::from_command_line("t", "  npx  ng test --watch=false ", 30);
        assert_eq!(config.command, vec!["npx", "ng", "test", "--watch=false"]);
        assert_eq!(config.timeout_secs, 30);
    }
}
