use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Backend;

use super::source::{
    BackendError, MetricSource, ProbeResult, QueryRange, TimestampedValue, alias_matches,
};

const INSTANT_QUERY_PATH: &str = "/api/v1/query";
const RANGE_QUERY_PATH: &str = "/api/v1/query_range";

/// Prometheus HTTP API client.
#[derive(Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
    target_label: String,
    alias_label: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: HashMap<String, String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    values: Vec<Value>,
}

impl PrometheusClient {
    /// Per-call deadlines are applied by callers; the client-level timeout
    /// only caps the slowest report query.
    pub fn new(backend: &Backend) -> Result<Self, BackendError> {
        let timeout_secs = backend.report_timeout_secs.max(backend.query_timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent(concat!("ping_outage_bot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|error| BackendError::Http(format!("http client build failed: {error}")))?;

        Ok(Self {
            http,
            base_url: backend.base_url.trim_end_matches('/').to_string(),
            target_label: backend.target_label.clone(),
            alias_label: backend.alias_label.clone(),
            timeout_secs,
        })
    }

    async fn post_query(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Option<QueryData>, BackendError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .form(form)
            .send()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        let decoded = serde_json::from_slice::<QueryResponse>(&body);
        if !status.is_success() {
            // Prometheus reports query errors as JSON bodies with 4xx/5xx.
            let message = match decoded {
                Ok(QueryResponse {
                    error: Some(error), ..
                }) => error,
                _ => String::from_utf8_lossy(&body).chars().take(200).collect(),
            };
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let decoded = decoded.map_err(|error| BackendError::Decode(error.to_string()))?;
        if decoded.status != "success" {
            return Err(BackendError::Rejected {
                error_type: decoded.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: decoded.error.unwrap_or_default(),
            });
        }

        Ok(decoded.data)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Http(error.to_string())
        }
    }

    fn label<'a>(&self, metric: &'a HashMap<String, String>, name: &str) -> &'a str {
        metric.get(name).map(String::as_str).unwrap_or("")
    }

    fn decode_vector(&self, data: QueryData) -> Result<Vec<ProbeResult>, BackendError> {
        match data.result_type.as_str() {
            "vector" => {
                let rows = parse_series_list(data.result)?;
                let mut results = Vec::with_capacity(rows.len());
                let mut rejected = 0usize;
                for row in rows {
                    let Some((_, value)) = row.value.as_ref().and_then(parse_sample) else {
                        rejected += 1;
                        continue;
                    };
                    results.push(ProbeResult {
                        target: self.label(&row.metric, &self.target_label).to_string(),
                        alias: self.label(&row.metric, &self.alias_label).to_string(),
                        failures_per_minute: value,
                    });
                }
                if rejected > 0 {
                    log::debug!("instant_query_rows_rejected count={}", rejected);
                }
                Ok(results)
            }
            "scalar" => Ok(parse_sample(&data.result)
                .map(|(_, value)| {
                    vec![ProbeResult {
                        target: String::new(),
                        alias: String::new(),
                        failures_per_minute: value,
                    }]
                })
                .unwrap_or_default()),
            other => Err(BackendError::Malformed(format!(
                "unexpected result type for instant query: {other}"
            ))),
        }
    }
}

impl MetricSource for PrometheusClient {
    async fn instant_query(&self, expr: &str) -> Result<Vec<ProbeResult>, BackendError> {
        let data = self
            .post_query(INSTANT_QUERY_PATH, &[("query", expr.to_string())])
            .await?;

        match data {
            Some(data) => self.decode_vector(data),
            None => Ok(Vec::new()),
        }
    }

    async fn range_query(
        &self,
        expr: &str,
        range: &QueryRange,
        target: &str,
        alias: &str,
    ) -> Result<Vec<TimestampedValue>, BackendError> {
        if range.end <= range.start {
            return Ok(Vec::new());
        }

        let step_secs = range.step.num_seconds().max(1);
        let data = self
            .post_query(
                RANGE_QUERY_PATH,
                &[
                    ("query", expr.to_string()),
                    ("start", range.start.timestamp().to_string()),
                    ("end", range.end.timestamp().to_string()),
                    ("step", format!("{step_secs}s")),
                ],
            )
            .await?;

        let Some(data) = data else {
            return Ok(Vec::new());
        };
        if data.result_type != "matrix" {
            return Err(BackendError::Malformed(format!(
                "unexpected result type for range query: {}",
                data.result_type
            )));
        }

        let series = parse_series_list(data.result)?.into_iter().find(|series| {
            self.label(&series.metric, &self.target_label) == target
                && alias_matches(
                    alias,
                    series.metric.get(&self.alias_label).map(String::as_str),
                )
        });

        Ok(series
            .map(|series| {
                series
                    .values
                    .iter()
                    .filter_map(parse_sample)
                    .filter_map(|(timestamp, value)| {
                        Some(TimestampedValue {
                            timestamp: timestamp_from_secs(timestamp)?,
                            value,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn parse_series_list(result: Value) -> Result<Vec<RawSeries>, BackendError> {
    if result.is_null() {
        return Ok(Vec::new());
    }

    serde_json::from_value(result).map_err(|error| BackendError::Decode(error.to_string()))
}

/// Parses a `[unix_seconds, "value"]` pair, rejecting non-finite values.
fn parse_sample(raw: &Value) -> Option<(f64, f64)> {
    let pair = raw.as_array()?;
    if pair.len() < 2 {
        return None;
    }

    let timestamp = match &pair[0] {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.parse::<f64>().ok()?,
        _ => return None,
    };
    let value = match &pair[1] {
        Value::String(text) => text.parse::<f64>().ok()?,
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };

    (timestamp.is_finite() && value.is_finite()).then_some((timestamp, value))
}

fn timestamp_from_secs(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PrometheusClient, QueryData, parse_sample, timestamp_from_secs};
    use crate::config::Backend;

    fn client() -> PrometheusClient {
        PrometheusClient::new(&Backend::default()).expect("client should build")
    }

    #[test]
    fn parses_prometheus_sample_pairs() {
        assert_eq!(
            parse_sample(&json!([1700000000.5, "7"])),
            Some((1700000000.5, 7.0))
        );
        assert_eq!(parse_sample(&json!([1700000000, "NaN"])), None);
        assert_eq!(parse_sample(&json!([1700000000, "+Inf"])), None);
        assert_eq!(parse_sample(&json!([1700000000])), None);
        assert_eq!(parse_sample(&json!({"ts": 1})), None);
    }

    #[test]
    fn decodes_vector_and_defaults_missing_labels() {
        let data: QueryData = serde_json::from_value(json!({
            "resultType": "vector",
            "result": [
                {"metric": {"instance": "10.0.0.1:80", "alias": "core"}, "value": [1700000000, "12"]},
                {"metric": {"instance": "10.0.0.2:80"}, "value": [1700000000, "0"]},
                {"metric": {}, "value": [1700000000, "3"]},
                {"metric": {"instance": "broken"}, "value": [1700000000]}
            ]
        }))
        .expect("fixture should decode");

        let rows = client().decode_vector(data).expect("vector should decode");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].target, "10.0.0.1:80");
        assert_eq!(rows[0].alias, "core");
        assert_eq!(rows[0].failures_per_minute, 12.0);
        assert_eq!(rows[1].alias, "");
        assert_eq!(rows[2].target, "");
    }

    #[test]
    fn empty_or_missing_result_is_empty() {
        let data: QueryData = serde_json::from_value(json!({"resultType": "vector"}))
            .expect("fixture should decode");
        assert!(client().decode_vector(data).expect("empty").is_empty());

        let data: QueryData =
            serde_json::from_value(json!({"resultType": "vector", "result": []}))
                .expect("fixture should decode");
        assert!(client().decode_vector(data).expect("empty").is_empty());
    }

    #[test]
    fn scalar_result_becomes_single_unlabelled_row() {
        let data: QueryData = serde_json::from_value(json!({
            "resultType": "scalar",
            "result": [1700000000, "4"]
        }))
        .expect("fixture should decode");

        let rows = client().decode_vector(data).expect("scalar should decode");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].failures_per_minute, 4.0);
    }

    #[test]
    fn converts_fractional_timestamps() {
        let timestamp = timestamp_from_secs(1700000000.25).expect("timestamp");
        assert_eq!(timestamp.timestamp_millis(), 1_700_000_000_250);
    }
}
