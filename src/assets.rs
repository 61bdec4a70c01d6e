use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{Body, Response};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};

pub struct Asset {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Read-only view of the bundled site/panel assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get(&self, path: &str) -> ApiResult<Option<Asset>>;
}

// ============================================================================
// S3 backend
// ============================================================================

pub struct S3Assets {
    client: S3Client,
    bucket_name: String,
}

impl S3Assets {
    pub fn new(client: S3Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }
}

#[async_trait]
impl AssetStore for S3Assets {
    async fn get(&self, path: &str) -> ApiResult<Option<Asset>> {
        let key = path.trim_start_matches('/');

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                error!("S3 GetObject error for '{}': {:?}", key, service_err);
                return Err(ApiError::StoreError(format!(
                    "Failed to read asset '{}'",
                    key
                )));
            }
        };

        let content_type = output
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(path).to_string());

        let data = output.body.collect().await.map_err(|e| {
            error!("S3 body read error for '{}': {:?}", key, e);
            ApiError::StoreError(format!("Failed to read asset '{}'", key))
        })?;

        info!("Served asset from bucket: {}", key);
        Ok(Some(Asset {
            body: data.into_bytes().to_vec(),
            content_type,
        }))
    }
}

// ============================================================================
// In-memory backend (tests, local runs)
// ============================================================================

#[derive(Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn with_file(mut self, path: &str, body: &[u8]) -> Self {
        self.files.insert(path.to_string(), body.to_vec());
        self
    }
}

#[async_trait]
impl AssetStore for MemoryAssets {
    async fn get(&self, path: &str) -> ApiResult<Option<Asset>> {
        Ok(self.files.get(path).map(|body| Asset {
            body: body.clone(),
            content_type: content_type_for(path).to_string(),
        }))
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

pub fn asset_response(asset: Asset) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("Content-Type", asset.content_type)
        .body(Body::Binary(asset.body))
        .unwrap()
}

// ============================================================================
// Login page
// ============================================================================

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Northgate Panel</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; justify-content: center;
           align-items: center; min-height: 100vh; margin: 0; background: #0f1220; color: #e8e8f0; }
    form { background: #1a1e33; padding: 2rem; border-radius: 8px; width: 18rem; }
    h1 { font-size: 1.1rem; margin-top: 0; }
    input { display: block; width: 100%; box-sizing: border-box; margin-bottom: 0.75rem;
            padding: 0.5rem; border: 1px solid #32395e; border-radius: 4px;
            background: #0f1220; color: inherit; }
    button { width: 100%; padding: 0.5rem; border: 0; border-radius: 4px;
             background: #4f6df5; color: white; cursor: pointer; }
    .error { color: #ff7a7a; margin: 0 0 0.75rem; }
  </style>
</head>
<body>
  <form method="post" action="/api/login">
    <h1>Panel sign in</h1>
    <!--ERROR-->
    <input type="text" name="username" placeholder="Username" autocomplete="username" required>
    <input type="password" name="password" placeholder="Password" autocomplete="current-password" required>
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#;

/// Render the panel login page, optionally with an inline error line.
pub fn login_page_response(status: u16, error: Option<&str>) -> Response<Body> {
    let html = match error {
        Some(message) => LOGIN_PAGE.replace(
            "<!--ERROR-->",
            &format!("<p class=\"error\">{}</p>", message),
        ),
        None => LOGIN_PAGE.replace("<!--ERROR-->", ""),
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::Text(html))
        .unwrap()
}
