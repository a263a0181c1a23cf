//! CI plan decisions requested from the completion service.

use crate::changes::ChangeSet;
use cipilot_core::{
    ChatMessage, CipilotError, CompletionRequest, CompletionService, ResponseFormat, Result,
};
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Either every target or an explicit list of paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Paths(Vec<String>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Paths(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Selection::default(),
            Some(OneOrMany::One(s)) if s.trim().eq_ignore_ascii_case("all") => Selection::All,
            Some(OneOrMany::One(s)) if s.trim().is_empty() => Selection::default(),
            Some(OneOrMany::One(s)) => Selection::Paths(vec![s]),
            Some(OneOrMany::Many(paths)) => Selection::Paths(paths),
        })
    }
}

fn paths_or_single<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(paths)) => paths,
    })
}

fn bool_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Which CI stages a change needs. Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CiPlan {
    /// Dependency/security scan.
    #[serde(rename = "run_snyk", deserialize_with = "bool_or_null")]
    pub run_security_scan: bool,

    pub tests_to_run: Selection,

    #[serde(deserialize_with = "paths_or_single")]
    pub sonar_inclusions: Vec<String>,

    pub lint_files: Selection,
}

/// Parse the service's JSON reply into a plan.
pub fn parse_plan(text: &str) -> Result<CiPlan> {
    serde_json::from_str(text.trim()).map_err(|e| CipilotError::MalformedPlan(e.to_string()))
}

/// Builds the planning prompt and interprets the reply.
pub struct PlanRequester;

impl PlanRequester {
    /// Build the JSON-mode completion request.
    pub fn build_request(
        changes: &ChangeSet,
        available_tests: &[String],
    ) -> Result<CompletionRequest> {
        let changed = serde_json::to_string(&changes.changed_files)?;
        let tests = serde_json::to_string(available_tests)?;

        let system = format!(
            r#"You are a Senior DevOps Architect. Analyze code changes to optimize CI resources.

Context:
- Changed Files: {changed}
- Available Tests: {tests}

Task - Return JSON with these keys:
1. "run_snyk": (boolean) TRUE if dependency files (package.json, pom.xml) or security logic (auth, sql) changed.
2. "tests_to_run": (list of strings) specific test paths. If config changes/global impact, return string "ALL".
3. "sonar_inclusions": (list of strings) source paths to scan.
4. "lint_files": (list of strings) source paths to lint.
   - If lint config (.eslintrc, prettierrc, package.json) changed, return string "ALL".
   - Otherwise, return ONLY the changed source code files (js, ts, py, etc).

Output Example:
{{
    "run_snyk": false,
    "tests_to_run": ["src/auth.spec.ts"],
    "sonar_inclusions": ["src/auth.ts"],
    "lint_files": ["src/auth.ts"]
}}
"#
        );

        Ok(CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("Git Diff:\n{}", changes.diff_text)),
        ])
        .with_response_format(ResponseFormat::JsonObject))
    }

    /// Ask `service` for a plan. Call and parse errors propagate.
    pub async fn request(
        service: &dyn CompletionService,
        changes: &ChangeSet,
        available_tests: &[String],
    ) -> Result<CiPlan> {
        let request = Self::build_request(changes, available_tests)?;
        let reply = service.complete(&request).await?;
        let plan = parse_plan(&reply)?;
        debug!(plan = ?plan, "Parsed CI plan");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipilot_core::fakes::{FailingCompletion, ScriptedCompletion};
    use cipilot_core::Role;

    fn changes() -> ChangeSet {
        ChangeSet {
            changed_files: vec!["src/auth.ts".to_string(), "package.json".to_string()],
            diff_text: "diff --git a/src/auth.ts b/src/auth.ts\n+login()".to_string(),
        }
    }

    #[test]
    fn parse_full_plan() {
        let plan = parse_plan(
            r#"{"run_snyk": true, "tests_to_run": ["src/auth.spec.ts"],
                "sonar_inclusions": ["src/auth.ts"], "lint_files": "ALL"}"#,
        )
        .unwrap();
        assert!(plan.run_security_scan);
        assert_eq!(
            plan.tests_to_run,
            Selection::Paths(vec!["src/auth.spec.ts".to_string()])
        );
        assert_eq!(plan.sonar_inclusions, vec!["src/auth.ts"]);
        assert_eq!(plan.lint_files, Selection::All);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let plan = parse_plan("{}").unwrap();
        assert_eq!(plan, CiPlan::default());
        assert!(!plan.run_security_scan);
        assert_eq!(plan.tests_to_run, Selection::Paths(Vec::new()));
        assert!(plan.sonar_inclusions.is_empty());
        assert_eq!(plan.lint_files, Selection::Paths(Vec::new()));
    }

    #[test]
    fn null_values_take_defaults() {
        let plan = parse_plan(
            r#"{"run_snyk": null, "tests_to_run": null,
                "sonar_inclusions": null, "lint_files": null}"#,
        )
        .unwrap();
        assert_eq!(plan, CiPlan::default());
    }

    #[test]
    fn all_is_case_insensitive_and_bare_strings_are_single_paths() {
        let plan = parse_plan(
            r#"{"tests_to_run": "all", "lint_files": "src/x.ts", "sonar_inclusions": "src/x.ts"}"#,
        )
        .unwrap();
        assert_eq!(plan.tests_to_run, Selection::All);
        assert_eq!(plan.lint_files, Selection::Paths(vec!["src/x.ts".to_string()]));
        assert_eq!(plan.sonar_inclusions, vec!["src/x.ts"]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let plan = parse_plan(r#"{"run_snyk": true, "reasoning": "deps changed"}"#).unwrap();
        assert!(plan.run_security_scan);
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_plan("Sure! Here's the plan: run everything").unwrap_err();
        assert!(matches!(err, CipilotError::MalformedPlan(_)));
    }

    #[test]
    fn wrong_types_are_malformed() {
        assert!(parse_plan(r#"{"run_snyk": "maybe"}"#).is_err());
        assert!(parse_plan(r#"["src/a.ts"]"#).is_err());
    }

    #[test]
    fn build_request_uses_json_mode_and_context() {
        let request =
            PlanRequester::build_request(&changes(), &["src/auth.spec.ts".to_string()]).unwrap();
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));

        let system = request.content_of(Role::System).unwrap();
        assert!(system.contains(r#"Changed Files: ["src/auth.ts","package.json"]"#));
        assert!(system.contains(r#"Available Tests: ["src/auth.spec.ts"]"#));
        assert!(system.contains(r#""run_snyk": false"#));

        let user = request.content_of(Role::User).unwrap();
        assert!(user.starts_with("Git Diff:\ndiff --git"));
    }

    #[tokio::test]
    async fn request_parses_reply() {
        let service = ScriptedCompletion::new([r#"{"run_snyk": true, "tests_to_run": "ALL"}"#]);
        let plan = PlanRequester::request(&service, &changes(), &[]).await.unwrap();
        assert!(plan.run_security_scan);
        assert_eq!(plan.tests_to_run, Selection::All);
    }

    #[tokio::test]
    async fn request_propagates_call_errors() {
        let service = FailingCompletion::new("timeout");
        let err = PlanRequester::request(&service, &changes(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CipilotError::Completion(_)));
    }

    #[tokio::test]
    async fn request_propagates_parse_errors() {
        let service = ScriptedCompletion::new(["not json"]);
        let err = PlanRequester::request(&service, &changes(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CipilotError::MalformedPlan(_)));
    }
}
