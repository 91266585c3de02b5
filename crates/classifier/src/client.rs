//! Classification service client

use crate::config::ClientConfig;
use crate::errors::{ClassifierError, Result};
use crate::session::{SessionContext, UserProfile};
use bundlelens_insights::{
    parse_batch, parse_metadata, parse_single_prediction, BatchPrediction, ServiceMetadata,
    SinglePrediction,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Login response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserProfile,
}

/// Client for the classification service.
///
/// Timeouts are enforced here; retries are left to the caller.
pub struct ClassifierClient {
    base_url: String,
    client: reqwest::Client,
}

impl ClassifierClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionContext> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        // A 401 here means bad credentials, not an expired session.
        let body = Self::read_json(response, false).await?;
        let token: TokenResponse = serde_json::from_value(body)?;

        info!(user = %token.user.email, "logged in");
        Ok(SessionContext {
            token: Some(token.access_token),
            user: Some(token.user),
        })
    }

    /// Model status, class names and global importances
    pub async fn metadata(&self, session: &SessionContext) -> Result<ServiceMetadata> {
        let request = self.client.get(self.url("/api/classify/metadata"));
        let response = Self::authorized(request, session).send().await?;
        let body = Self::read_json(response, true).await?;
        Ok(parse_metadata(&body)?)
    }

    /// Classify one client from its raw column values
    pub async fn classify_single(
        &self,
        session: &SessionContext,
        input: &Value,
    ) -> Result<SinglePrediction> {
        if !input.is_object() {
            return Err(ClassifierError::InvalidInput(
                "single prediction input must be a JSON object".to_string(),
            ));
        }

        let started = Instant::now();
        let request = self.client.post(self.url("/api/classify/single")).json(input);
        let response = Self::authorized(request, session).send().await?;
        let body = Self::read_json(response, true).await?;
        let prediction = parse_single_prediction(&body)?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            predicted = %prediction.row.predicted_class,
            "single prediction complete"
        );
        Ok(prediction)
    }

    /// Upload a CSV file and classify every row
    pub async fn classify_batch(&self, session: &SessionContext, path: &Path) -> Result<BatchPrediction> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClassifierError::UnsupportedUpload(path.display().to_string()))?
            .to_string();
        Self::check_csv(&file_name)?;

        let contents = tokio::fs::read(path).await?;
        self.classify_batch_bytes(session, &file_name, contents).await
    }

    /// Upload CSV contents under `file_name` and classify every row
    pub async fn classify_batch_bytes(
        &self,
        session: &SessionContext,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<BatchPrediction> {
        Self::check_csv(file_name)?;

        let size = contents.len();
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let started = Instant::now();
        let request = self.client.post(self.url("/api/classify/batch")).multipart(form);
        let response = Self::authorized(request, session).send().await?;
        let body = Self::read_json(response, true).await?;
        let batch = parse_batch(&body)?;

        info!(
            file = file_name,
            bytes = size,
            rows = batch.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch prediction complete"
        );
        Ok(batch)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        match session.bearer() {
            Some(bearer) => request.header("Authorization", bearer),
            None => request,
        }
    }

    fn check_csv(file_name: &str) -> Result<()> {
        let is_csv = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Ok(())
        } else {
            Err(ClassifierError::UnsupportedUpload(file_name.to_string()))
        }
    }

    /// Map the response status onto errors and decode the JSON body
    async fn read_json(response: Response, session_required: bool) -> Result<Value> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && session_required {
            warn!("classification service rejected the session");
            return Err(ClassifierError::Unauthorized);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| match body.get("detail") {
                    Some(Value::String(detail)) => Some(detail.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                })
                .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));

            if status == StatusCode::SERVICE_UNAVAILABLE {
                return Err(ClassifierError::ServiceUnavailable(detail));
            }
            return Err(ClassifierError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
