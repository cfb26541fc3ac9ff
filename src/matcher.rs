//! Trigger matching.
//!
//! A trigger matches a request iff it has a non-empty token and both the
//! project name and the token equal the request's fields exactly.

use crate::payload::{BuildRequest, KEY_PROJECT, KEY_TOKEN};
use crate::trigger::BuildTrigger;

/// Result of evaluating one trigger against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutput {
    /// Project and token both equal; the trigger should fire.
    Match,
    /// Project or token differs.
    NoMatch,
    /// The trigger has no token configured and can never match.
    Unconfigured,
    /// The request lacks a field needed for comparison.
    MissingField(&'static str),
}

/// Evaluate one trigger against a request.
#[must_use]
pub fn evaluate(trigger: &dyn BuildTrigger, request: &BuildRequest) -> MatchOutput {
    let Some(expected_token) = trigger.remote_build_token().filter(|t| !t.is_empty()) else {
        return MatchOutput::Unconfigured;
    };

    let Some(project) = request.project() else {
        return MatchOutput::MissingField(KEY_PROJECT);
    };
    if project != trigger.project_name() {
        return MatchOutput::NoMatch;
    }

    match request.token() {
        None => MatchOutput::MissingField(KEY_TOKEN),
        Some(token) if token == expected_token => MatchOutput::Match,
        Some(_) => MatchOutput::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct Fixed {
        project: &'static str,
        token: Option<&'static str>,
    }

    impl BuildTrigger for Fixed {
        fn project_name(&self) -> &str {
            self.project
        }

        fn remote_build_token(&self) -> Option<&str> {
            self.token
        }

        fn schedule_build(&self, _queue_name: &str, _parameters: &[Value]) {}
    }

    fn guarded(project: &'static str, token: &'static str) -> Fixed {
        Fixed {
            project,
            token: Some(token),
        }
    }

    fn request(json: &str) -> BuildRequest {
        BuildRequest::parse(json).unwrap()
    }

    fn direct(project: &str, token: &str) -> BuildRequest {
        BuildRequest::new(project, token, Vec::new())
    }

    #[test]
    fn exact_project_and_token_match() {
        let t = guarded("app", "secret");
        assert_eq!(evaluate(&t, &direct("app", "secret")), MatchOutput::Match);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let t = guarded("app", "secret");
        assert_eq!(evaluate(&t, &direct("App", "secret")), MatchOutput::NoMatch);
        assert_eq!(evaluate(&t, &direct("app", "Secret")), MatchOutput::NoMatch);
    }

    #[test]
    fn wrong_token_does_not_match() {
        let t = guarded("app", "secret");
        let req = request(r#"{"project":"app","token":"wrong"}"#);
        assert_eq!(evaluate(&t, &req), MatchOutput::NoMatch);
    }

    #[test]
    fn numeric_fields_match_their_text() {
        let t = guarded("42", "12345");
        let req = request(r#"{"project":42,"token":12345}"#);
        assert_eq!(evaluate(&t, &req), MatchOutput::Match);
    }

    #[test]
    fn trigger_without_token_never_matches() {
        let none = Fixed {
            project: "app",
            token: None,
        };
        let empty = guarded("app", "");
        let req = request(r#"{"project":"app","token":""}"#);
        assert_eq!(evaluate(&none, &req), MatchOutput::Unconfigured);
        assert_eq!(evaluate(&empty, &req), MatchOutput::Unconfigured);
    }

    #[test]
    fn missing_fields_are_reported() {
        let t = guarded("app", "secret");
        assert_eq!(
            evaluate(&t, &request(r#"{"token":"secret"}"#)),
            MatchOutput::MissingField("project")
        );
        assert_eq!(
            evaluate(&t, &request(r#"{"project":"app"}"#)),
            MatchOutput::MissingField("token")
        );
        assert_eq!(evaluate(&t, &request("{}")), MatchOutput::MissingField("project"));
    }

    #[test]
    fn other_project_without_token_field_is_plain_mismatch() {
        let t = guarded("app", "secret");
        assert_eq!(evaluate(&t, &request(r#"{"project":"other"}"#)), MatchOutput::NoMatch);
    }
}
