//! REST storage node
//!
//! Speaks the record API exposed by each storage node:
//! - `POST {url}/data/create` with `{"schema": .., "data": [record]}`
//! - `POST {url}/data/read` with `{"schema": .., "filter": {..}}`
//!
//! Both requests carry a bearer token issued out of band.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

use super::{NodeError, NodeResult, StorageNode};
use crate::domain::{CredentialRecord, RecordFilter};

#[derive(Serialize)]
struct CreateRequest<'a> {
    schema: &'a str,
    data: [&'a CredentialRecord; 1],
}

#[derive(Serialize)]
struct ReadRequest<'a> {
    schema: &'a str,
    filter: &'a RecordFilter,
}

/// Storage node reached over HTTPS
pub struct HttpNode {
    name: String,
    base_url: String,
    token: Zeroizing<String>,
    client: reqwest::Client,
}

impl HttpNode {
    /// Create a node client for `base_url`
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, token: Zeroizing<String>) -> Self {
        Self::with_client(name, base_url, token, reqwest::Client::new())
    }

    /// Create a node client sharing an existing `reqwest` client
    pub fn with_client(
        name: impl Into<String>,
        base_url: impl Into<String>,
        token: Zeroizing<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> NodeResult<(StatusCode, String)> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(node = %self.name, %url, "sending node request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.as_str())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl StorageNode for HttpNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, schema: &str, record: &CredentialRecord) -> NodeResult<()> {
        let request = CreateRequest {
            schema,
            data: [record],
        };
        let (status, body) = self.post("/data/create", &request).await?;

        if status != StatusCode::OK {
            return Err(NodeError::Rejected(format!("create returned {status}")));
        }
        check_create_errors(&parse_json(&body)?)
    }

    async fn query(&self, schema: &str, filter: &RecordFilter) -> NodeResult<Vec<CredentialRecord>> {
        let request = ReadRequest { schema, filter };
        let (status, body) = self.post("/data/read", &request).await?;

        if status != StatusCode::OK {
            return Err(NodeError::Rejected(format!("read returned {status}")));
        }
        parse_read_response(&self.name, parse_json(&body)?)
    }
}

fn parse_json(body: &str) -> NodeResult<Value> {
    serde_json::from_str(body)
        .map_err(|e| NodeError::Malformed(format!("response body is not JSON: {e}")))
}

/// A create succeeds only when the response reports no per-record errors
fn check_create_errors(body: &Value) -> NodeResult<()> {
    if !body.is_object() {
        return Err(NodeError::Malformed("create response is not a JSON object".to_string()));
    }
    match body.pointer("/data/errors") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(errors)) if errors.is_empty() => Ok(()),
        Some(errors) => Err(NodeError::Rejected(format!("record errors: {errors}"))),
    }
}

/// Decodes the `data` array of a read response into typed records
///
/// Entries that do not have the four record fields are dropped with a warning
/// rather than failing the whole response.
fn parse_read_response(node: &str, body: Value) -> NodeResult<Vec<CredentialRecord>> {
    let Value::Object(mut object) = body else {
        return Err(NodeError::Malformed("response is not a JSON object".to_string()));
    };
    let entries = match object.remove("data") {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            return Err(NodeError::Malformed(format!(
                "expected `data` array, got {other}"
            )));
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<CredentialRecord>(entry) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(%node, error = %e, "dropping malformed record"),
        }
    }
    Ok(records)
}
