//! FitCooker object storage client
//!
//! Uploads and removes recipe images and avatars kept in the hosted
//! storage service, and builds their public URLs.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API error: {message} (Status: {status})")]
    ApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Upload options
#[derive(Debug, Clone, Serialize, Default)]
pub struct FileOptions {
    pub cache_control: Option<String>,
    pub content_type: Option<String>,
    pub upsert: Option<bool>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = Some(cache_control.to_string());
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }
}

/// Key of a stored object, `{bucket}/{path}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

pub struct StorageClient {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    http_client: Client,
}

pub struct StorageBucketClient<'a> {
    parent: &'a StorageClient,
    bucket_id: String,
}

impl StorageClient {
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
            http_client,
        }
    }

    /// Send requests as the signed-in user instead of the anonymous key
    pub fn with_auth(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    pub fn from<'a>(&'a self, bucket_id: &str) -> StorageBucketClient<'a> {
        StorageBucketClient {
            parent: self,
            bucket_id: bucket_id.to_string(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", token))
    }
}

impl<'a> StorageBucketClient<'a> {
    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    fn object_url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        if path.is_empty() || path.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let url = Url::parse(&format!(
            "{}/storage/v1/object/{}/{}",
            self.parent.base_url, self.bucket_id, path
        ))?;
        Ok(url)
    }

    /// Upload in-memory content to `path`
    pub async fn upload_bytes(
        &self,
        path: &str,
        data: Vec<u8>,
        options: Option<FileOptions>,
    ) -> Result<UploadResponse> {
        let url = self.object_url(path)?;
        let options = options.unwrap_or_default();

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut part = Part::bytes(data).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let mut request = self.parent.authorize(self.parent.http_client.post(url));
        if let Some(cache_control) = &options.cache_control {
            request = request.header("cache-control", format!("max-age={}", cache_control));
        }
        if let Some(upsert) = options.upsert {
            request = request.header("x-upsert", upsert.to_string());
        }

        log::debug!("uploading {}/{}", self.bucket_id, path);
        let response = check_status(request.multipart(form).send().await?).await?;
        Ok(response.json::<UploadResponse>().await?)
    }

    /// Delete objects, given as paths relative to the bucket
    pub async fn remove(&self, paths: Vec<&str>) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.parent.base_url, self.bucket_id
        );

        let payload = serde_json::json!({
            "prefixes": paths
        });

        let request = self.parent.authorize(self.parent.http_client.delete(&url));
        check_status(request.json(&payload).send().await?).await?;
        Ok(())
    }

    /// URL of an object in a public bucket
    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.parent.base_url,
            self.bucket_id,
            path.trim_start_matches('/')
        )
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(text);
    Err(StorageError::ApiError { message, status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StorageClient {
        StorageClient::new(&server.uri(), "fake-key", reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_upload_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/recipe-images/user-1/recipes/a.png"))
            .and(header("apikey", "fake-key"))
            .and(header("Authorization", "Bearer user-token"))
            .and(header("x-upsert", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Key": "recipe-images/user-1/recipes/a.png"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let storage = client(&mock_server).with_auth("user-token");
        let result = storage
            .from("recipe-images")
            .upload_bytes(
                "user-1/recipes/a.png",
                vec![0x89, 0x50, 0x4e, 0x47],
                Some(
                    FileOptions::new()
                        .with_content_type("image/png")
                        .with_upsert(false),
                ),
            )
            .await;

        assert!(result.is_ok(), "upload failed: {:?}", result.err());
        assert_eq!(result.unwrap().key, "recipe-images/user-1/recipes/a.png");
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/avatars/user-1/a.png"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "The resource already exists" })),
            )
            .mount(&mock_server)
            .await;

        let storage = client(&mock_server);
        match storage.from("avatars").upload_bytes("user-1/a.png", vec![1], None).await {
            Err(StorageError::ApiError { message, status }) => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "The resource already exists");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/recipe-images"))
            .and(header("Authorization", "Bearer user-token"))
            .and(body_json(json!({ "prefixes": ["user-1/recipes/a.png"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let storage = client(&mock_server).with_auth("user-token");
        storage
            .from("recipe-images")
            .remove(vec!["user-1/recipes/a.png"])
            .await
            .unwrap();
    }

    #[test]
    fn test_public_url_and_path_checks() {
        let storage = StorageClient::new(
            "https://project.supabase.co/",
            "fake-key",
            reqwest::Client::new(),
        );
        let bucket = storage.from("avatars");

        assert_eq!(
            bucket.get_public_url("/user-1/a.png"),
            "https://project.supabase.co/storage/v1/object/public/avatars/user-1/a.png"
        );
        assert!(matches!(
            bucket.object_url("user-1/../other/a.png"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(bucket.object_url(""), Err(StorageError::InvalidPath(_))));
    }
}
