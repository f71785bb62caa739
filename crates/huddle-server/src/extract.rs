//! Request extractors that report failures as `validation_error`.

use std::convert::Infallible;
use std::fmt::Display;
use std::ops::RangeInclusive;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use huddle_config::{is_league_key, is_team_key};
use serde::de::DeserializeOwned;

use crate::error::{FieldError, Result, ServerError};

// ─────────────────────────────────────────────────────────────────────────────
// Query strings
// ─────────────────────────────────────────────────────────────────────────────

/// `Query<T>` whose rejections become 422 `validation_error`.
///
/// Deserialization failures (a non-integer `week`, say) are reported against
/// the `query` field; range and pattern checks happen afterwards in
/// [`FieldErrors`] so they can name the offending parameter.
#[derive(Debug, Clone, Default)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidQuery(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> ServerError {
    ServerError::Validation(vec![FieldError::new("query", rejection.body_text())])
}

/// Decoded query string that keeps repeated keys (`positions=qb&positions=wr`).
///
/// Typed query structs reject duplicate keys, so repeatable parameters are
/// read from here instead.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        Self(
            query
                .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    /// Every value for `name`, in order.
    pub fn all(&self, name: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self::parse(parts.uri.query()))
    }
}

/// Trimmed value, with blank strings counted as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Collects field problems so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Team key `{game}.l.{league}.t.{team}`.
    pub fn team_key(&mut self, field: &str, value: Option<&str>, required: bool) -> Option<String> {
        let Some(value) = present(value) else {
            if required {
                self.push(field, "field required");
            }
            return None;
        };
        if is_team_key(value) {
            Some(value.to_string())
        } else {
            self.push(field, r"string does not match pattern ^\d+\.l\.\d+\.t\.\d+$");
            None
        }
    }

    /// Optional league key `{game}.l.{league}`.
    pub fn league_key(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = present(value)?;
        if is_league_key(value) {
            Some(value.to_string())
        } else {
            self.push(field, r"string does not match pattern ^\d+\.l\.\d+$");
            None
        }
    }

    /// Optional number within `range`.
    pub fn in_range<T>(&mut self, field: &str, value: Option<T>, range: RangeInclusive<T>) -> Option<T>
    where
        T: PartialOrd + Display,
    {
        let value = value?;
        if range.contains(&value) {
            Some(value)
        } else {
            self.push(
                field,
                format!(
                    "value must be between {} and {}",
                    range.start(),
                    range.end()
                ),
            );
            None
        }
    }

    /// `Err(validation_error)` if anything was recorded.
    pub fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServerError::Validation(self.0))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON bodies
// ─────────────────────────────────────────────────────────────────────────────

/// `Json<T>` whose rejections become 422 `validation_error`.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ServerError::Validation(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct WeekQuery {
        team_key: Option<String>,
        week: Option<u32>,
    }

    async fn extract_week(uri: &str) -> std::result::Result<ValidQuery<WeekQuery>, ServerError> {
        let (mut parts, _) = HttpRequest::builder().uri(uri).body(()).unwrap().into_parts();
        ValidQuery::<WeekQuery>::from_request_parts(&mut parts, &()).await
    }

    #[test]
    fn test_query_params_keep_repeats() {
        let params = QueryParams::parse(Some("positions=qb&positions=wr%2Cte&team_key=+&x=1"));
        assert_eq!(params.all("positions"), vec!["qb", "wr,te"]);
        assert_eq!(params.all("x"), vec!["1"]);
        assert!(QueryParams::parse(None).all("x").is_empty());
    }

    #[tokio::test]
    async fn test_valid_query_decodes_typed_fields() {
        let ValidQuery(query) = extract_week("/v1/roster?team_key=423.l.1.t.2&week=3&extra=ignored")
            .await
            .unwrap();
        assert_eq!(query.team_key.as_deref(), Some("423.l.1.t.2"));
        assert_eq!(query.week, Some(3));

        let ValidQuery(query) = extract_week("/v1/roster").await.unwrap();
        assert!(query.team_key.is_none());
        assert!(query.week.is_none());
    }

    #[tokio::test]
    async fn test_valid_query_rejects_non_integer() {
        match extract_week("/v1/roster?team_key=423.l.1.t.2&week=abc").await {
            Err(ServerError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "query");
                assert!(!fields[0].message.is_empty());
            }
            other => panic!("expected validation error, got {:?}", other.map(|q| q.0)),
        }
    }

    #[test]
    fn test_field_errors_collects_all() {
        let mut errors = FieldErrors::default();
        assert_eq!(errors.team_key("team_key", Some("  "), true), None);
        assert_eq!(errors.in_range("week", Some(40u32), 1..=18), None);
        assert_eq!(errors.league_key("league_key", Some("bad")), None);

        match errors.finish() {
            Err(ServerError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["team_key", "week", "league_key"]);
                assert_eq!(fields[0].message, "field required");
                assert_eq!(fields[1].message, "value must be between 1 and 18");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_field_errors_accepts_valid_input() {
        let mut errors = FieldErrors::default();
        assert_eq!(
            errors.team_key("team_key", Some(" 423.l.1.t.2 "), true).as_deref(),
            Some("423.l.1.t.2")
        );
        assert_eq!(errors.in_range("week", Some(3u32), 1..=18), Some(3));
        assert_eq!(errors.in_range::<i32>("nfl_season", None, 2000..=2100), None);
        assert_eq!(errors.team_key("team_key", None, false), None);
        assert_eq!(errors.league_key("league_key", Some("")), None);
        assert!(errors.finish().is_ok());
    }
}
