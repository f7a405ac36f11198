//! FitCooker PostgREST client
//!
//! Row-level access to the hosted database tables through PostgREST.
//!
//! # Features
//!
//! - Query API (`select`, `insert`, `update`, `upsert`, `delete`)
//! - Filtering (`eq`, `neq`, `ilike`, `in_list`, `is_null`, ...)
//! - Embedded resources through the `select` column list
//! - Ordering and pagination
//! - RPC function calls

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// PostgreSQL unique-violation error code
const UNIQUE_VIOLATION: &str = "23505";

/// PostgREST code for "no rows" on single-object responses
const NO_ROWS: &str = "PGRST116";

/// Error body returned by PostgREST
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl PostgrestError {
    /// Whether the error is a unique-constraint violation
    pub fn is_duplicate(&self) -> bool {
        match self {
            PostgrestError::ApiError { details, .. } => {
                details.code.as_deref() == Some(UNIQUE_VIOLATION)
                    || details
                        .message
                        .as_deref()
                        .map_or(false, |m| m.contains("duplicate"))
            }
            PostgrestError::UnparsedApiError { message, .. } => message.contains("duplicate"),
            _ => false,
        }
    }

    /// Whether the error reports that no row matched
    pub fn is_not_found(&self) -> bool {
        match self {
            PostgrestError::ApiError { details, status } => {
                details.code.as_deref() == Some(NO_ROWS) || *status == StatusCode::NOT_FOUND
            }
            PostgrestError::UnparsedApiError { status, .. } => *status == StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Request builder bound to one table (or one RPC function)
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    rpc_params: Option<Value>,
}

impl PostgrestClient {
    /// Create a client for `table`
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", key);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
            rpc_params: None,
        }
    }

    /// Create a client that calls the stored function `function_name`
    pub fn rpc(
        base_url: &str,
        api_key: &str,
        function_name: &str,
        params: Value,
        http_client: Client,
    ) -> Self {
        let mut client = Self::new(base_url, api_key, function_name, http_client);
        client.rpc_params = Some(params);
        client
    }

    /// Table (or function) this client targets
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Send requests as the signed-in user
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    fn set_param(mut self, key: &str, value: String) -> Self {
        self.query_params.retain(|(k, _)| k != key);
        self.query_params.push((key.to_string(), value));
        self
    }

    fn filter(mut self, column: &str, operator: &str, value: &str) -> Self {
        self.query_params
            .push((column.to_string(), format!("{}.{}", operator, value)));
        self
    }

    /// Columns to return, including embedded resources such as
    /// `*,profiles(nome)`
    pub fn select(self, columns: &str) -> Self {
        self.set_param("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: &str) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: &str) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-sensitive pattern match; `*` is the wildcard
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "like", pattern)
    }

    /// Case-insensitive pattern match; `*` is the wildcard
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    /// Membership filter. Values holding reserved characters are quoted.
    pub fn in_list(self, column: &str, values: &[&str]) -> Self {
        let value_list = values
            .iter()
            .map(|v| quote_list_value(v))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", &format!("({})", value_list))
    }

    pub fn order(self, column: &str, order: SortOrder) -> Self {
        let direction = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        self.set_param("order", format!("{}.{}", column, direction))
    }

    pub fn limit(self, count: i32) -> Self {
        self.set_param("limit", count.to_string())
    }

    pub fn offset(self, count: i32) -> Self {
        self.set_param("offset", count.to_string())
    }

    fn build_url(&self) -> Result<String, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;

        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }

    /// Fetch matching rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let response = check_status(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Fetch the first matching row, if any
    pub async fn execute_one<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, PostgrestError> {
        let rows = self.clone().limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or an array of rows, returning the stored rows
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        self.write(Method::POST, Some(serde_json::to_value(values)?), "return=representation")
            .await
    }

    /// Insert, or merge into the row sharing the same primary/unique key
    pub async fn upsert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        self.write(
            Method::POST,
            Some(serde_json::to_value(values)?),
            "resolution=merge-duplicates,return=representation",
        )
        .await
    }

    /// Patch every row matching the filters
    pub async fn update<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        if self.query_params.iter().all(|(k, _)| is_modifier(k)) {
            return Err(PostgrestError::InvalidParameters(
                "update requires at least one filter".to_string(),
            ));
        }
        self.write(Method::PATCH, Some(serde_json::to_value(values)?), "return=representation")
            .await
    }

    /// Delete every row matching the filters
    pub async fn delete(&self) -> Result<Value, PostgrestError> {
        if self.query_params.iter().all(|(k, _)| is_modifier(k)) {
            return Err(PostgrestError::InvalidParameters(
                "delete requires at least one filter".to_string(),
            ));
        }
        self.write(Method::DELETE, None, "return=representation").await
    }

    async fn write(
        &self,
        method: Method,
        body: Option<Value>,
        prefer: &'static str,
    ) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("{} {}", method, url);

        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static(prefer),
        );

        let mut request = self.http_client.request(method, &url).headers(headers);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = check_status(request.send().await?).await?;

        // 204 No Content and empty bodies come back as Null.
        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;
        if body_text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&body_text)
                .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
        }
    }

    /// Call the stored function this client was created for
    pub async fn call_rpc<T: for<'de> Deserialize<'de>>(&self) -> Result<T, PostgrestError> {
        let params = self.rpc_params.as_ref().ok_or_else(|| {
            PostgrestError::InvalidParameters(
                "Client was not created for RPC. Use PostgrestClient::rpc().".to_string(),
            )
        })?;
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, self.table);
        log::debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers.clone())
            .json(params)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;

        // Functions returning void answer with an empty body
        let result = if body_text.trim().is_empty() {
            serde_json::from_value::<T>(Value::Null)
        } else {
            serde_json::from_str::<T>(&body_text)
        };
        result.map_err(|e| {
            PostgrestError::DeserializationError(format!(
                "Failed to deserialize RPC response: {}",
                e
            ))
        })
    }
}

fn is_modifier(key: &str) -> bool {
    matches!(key, "select" | "order" | "limit" | "offset")
}

fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Turn a non-success response into an API error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PostgrestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => Err(PostgrestError::ApiError { details, status }),
        Err(_) => Err(PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, table: &str) -> PostgrestClient {
        PostgrestClient::new(&server.uri(), "fake-key", table, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_select_with_filters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredientes"))
            .and(query_param("select", "*"))
            .and(query_param("nome", "ilike.*arroz*"))
            .and(query_param("limit", "5"))
            .and(header("apikey", "fake-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "nome": "arroz branco" },
                { "id": 2, "nome": "arroz integral" }
            ])))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server, "ingredientes")
            .select("*")
            .ilike("nome", "*arroz*")
            .limit(5)
            .execute::<Value>()
            .await;

        assert!(result.is_ok(), "select failed: {:?}", result.err());
        let rows = result.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["nome"], "arroz integral");
    }

    #[tokio::test]
    async fn test_execute_one() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/avaliacoes"))
            .and(query_param("receita_id", "eq.7"))
            .and(query_param("usuario_id", "eq.user-1"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3, "nota": 4 }])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/avaliacoes"))
            .and(query_param("receita_id", "eq.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let found = client(&mock_server, "avaliacoes")
            .select("*")
            .eq("receita_id", "7")
            .eq("usuario_id", "user-1")
            .execute_one::<Value>()
            .await
            .unwrap();
        assert_eq!(found, Some(json!({ "id": 3, "nota": 4 })));

        let missing = client(&mock_server, "avaliacoes")
            .eq("receita_id", "8")
            .execute_one::<Value>()
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_build_url_keeps_repeated_filters() {
        let client = PostgrestClient::new(
            "http://localhost:54321/",
            "fake-key",
            "receitas",
            reqwest::Client::new(),
        )
        .select("*")
        .gte("tempo_preparo", "10")
        .lte("tempo_preparo", "30")
        .order("created_at", SortOrder::Ascending)
        .order("created_at", SortOrder::Descending);

        let url = Url::parse(&client.build_url().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/rest/v1/receitas");
        assert!(pairs.contains(&("tempo_preparo".to_string(), "gte.10".to_string())));
        assert!(pairs.contains(&("tempo_preparo".to_string(), "lte.30".to_string())));
        assert_eq!(
            pairs.iter().filter(|(k, _)| k == "order").count(),
            1,
            "order is replaced, not repeated"
        );
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
    }

    #[test]
    fn test_in_list_quoting() {
        assert_eq!(quote_list_value("abc-123"), "abc-123");
        assert_eq!(quote_list_value("a,b"), "\"a,b\"");
        assert_eq!(quote_list_value("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[tokio::test]
    async fn test_insert() {
        let mock_server = MockServer::start().await;

        let insert_data = json!({ "seguidor_id": "a", "seguido_id": "b" });
        let expected_response = json!([{ "id": 10, "seguidor_id": "a", "seguido_id": "b" }]);

        Mock::given(method("POST"))
            .and(path("/rest/v1/seguidores"))
            .and(header("apikey", "fake-key"))
            .and(header("content-type", "application/json"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(&insert_data))
            .respond_with(ResponseTemplate::new(201).set_body_json(&expected_response))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "seguidores")
            .insert(&insert_data)
            .await
            .unwrap();
        assert_eq!(data, expected_response);
    }

    #[tokio::test]
    async fn test_upsert_prefer_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": "p1" }])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "profiles")
            .upsert(json!({ "id": "p1", "nome": "Ana" }))
            .await
            .unwrap();
        assert_eq!(data, json!([{ "id": "p1" }]));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let mock_server = MockServer::start().await;

        let update_data = json!({ "nota": 5 });
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/avaliacoes"))
            .and(query_param("id", "eq.1"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(&update_data))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "nota": 5 }])))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/avaliacoes"))
            .and(query_param("id", "eq.1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let updated = client(&mock_server, "avaliacoes")
            .eq("id", "1")
            .update(&update_data)
            .await
            .unwrap();
        assert_eq!(updated, json!([{ "id": 1, "nota": 5 }]));

        let deleted = client(&mock_server, "avaliacoes")
            .eq("id", "1")
            .delete()
            .await
            .unwrap();
        assert_eq!(deleted, Value::Null);
    }

    #[tokio::test]
    async fn test_unfiltered_writes_are_rejected() {
        let mock_server = MockServer::start().await;

        let result = client(&mock_server, "receitas").select("*").delete().await;
        assert!(matches!(result, Err(PostgrestError::InvalidParameters(_))));

        let result = client(&mock_server, "receitas")
            .update(json!({ "status": "inativa" }))
            .await;
        assert!(matches!(result, Err(PostgrestError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_rpc() {
        let mock_server = MockServer::start().await;

        let params = json!({ "p_titulo": "Bolo", "p_porcoes": 8 });
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/create_recipe_transaction"))
            .and(body_json(&params))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(42)))
            .mount(&mock_server)
            .await;

        let client = PostgrestClient::rpc(
            &mock_server.uri(),
            "fake-key",
            "create_recipe_transaction",
            params,
            reqwest::Client::new(),
        );
        let id: i64 = client.call_rpc().await.unwrap();
        assert_eq!(id, 42);

        let not_rpc = PostgrestClient::new(&mock_server.uri(), "fake-key", "receitas", reqwest::Client::new());
        let result = not_rpc.call_rpc::<i64>().await;
        assert!(matches!(result, Err(PostgrestError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_void_rpc() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/calcular_macros_receita"))
            .and(body_json(json!({ "receita_id_param": 3 })))
            .respond_with(ResponseTemplate::new(204))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = PostgrestClient::rpc(
            &mock_server.uri(),
            "fake-key",
            "calcular_macros_receita",
            json!({ "receita_id_param": 3 }),
            reqwest::Client::new(),
        );
        client.call_rpc::<()>().await.unwrap();
        let value: Value = client.call_rpc().await.unwrap();
        assert_eq!(value, Value::Null);

        // A non-nullable result still needs a body
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/contar_receitas"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        let count = PostgrestClient::rpc(
            &mock_server.uri(),
            "fake-key",
            "contar_receitas",
            json!({}),
            reqwest::Client::new(),
        );
        let result = count.call_rpc::<i64>().await;
        assert!(matches!(result, Err(PostgrestError::DeserializationError(_))));
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/ingredientes"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"ingredientes_nome_key\"",
                "details": null,
                "hint": null
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/server_error"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, "ingredientes")
            .insert(json!({ "nome": "sal" }))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        match err {
            PostgrestError::ApiError { details, status } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(details.code, Some("23505".to_string()));
            }
            e => panic!("Expected ApiError, got {:?}", e),
        }

        let err = client(&mock_server, "server_error")
            .select("*")
            .execute::<Value>()
            .await
            .unwrap_err();
        assert!(!err.is_duplicate());
        match err {
            PostgrestError::UnparsedApiError { message, status } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "Internal Server Error");
            }
            e => panic!("Expected UnparsedApiError, got {:?}", e),
        }
    }
}
