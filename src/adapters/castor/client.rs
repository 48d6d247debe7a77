//! Castor REST API client
//!
//! Authenticates with the OAuth client-credentials grant, walks HAL-paginated
//! collections and parses the `;`-delimited CSV export endpoints.

use super::models::{
    CreatedInstance, FieldDependencyModel, FieldValuePost, HalPage, RecordModel,
    ReportInstanceModel, SurveyModel, SurveyPackageInstanceModel, TokenResponse, UploadResponse,
    UploadTarget,
};
use super::source::StudySource;
use crate::config::CastorConfig;
use crate::domain::{ApiError, CastorError, DataRow, OptionGroup, Result, StructureRow};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Delimiter of Castor's CSV exports
const EXPORT_DELIMITER: u8 = b';';

/// HTTP client for one Castor study
///
/// # Example
///
/// ```no_run
/// use castor_edc::adapters::castor::CastorClient;
/// use castor_edc::config::CastorConfig;
///
/// # async fn example() -> castor_edc::domain::Result<()> {
/// let config = CastorConfig::default();
/// let client = CastorClient::connect(config).await?;
/// println!("Connected to {}", client.base_url());
/// # Ok(())
/// # }
/// ```
pub struct CastorClient {
    /// Server root, without trailing slash
    base_url: String,

    client: Client,

    /// Bearer token (set by `authenticate`)
    auth_token: Option<String>,

    config: CastorConfig,
}

impl CastorClient {
    /// Builds an unauthenticated client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CastorConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| ApiError::ConnectionFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            auth_token: None,
            config,
        })
    }

    /// Builds a client and fetches its access token
    pub async fn connect(config: CastorConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Exchanges the client credentials for a bearer token
    pub async fn authenticate(&mut self) -> Result<()> {
        let url = format!("{}/oauth/token", self.base_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_ref()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthenticationFailed(format!(
                "Token request failed with status {status}: {body}"
            ))
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        tracing::info!(base_url = %self.base_url, "Authenticated with Castor");
        self.auth_token = Some(token.access_token);
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    fn study_url(&self, path: &str) -> String {
        format!(
            "{}/api/study/{}/{}",
            self.base_url,
            self.config.study_id,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), context = %context, "Castor request failed");
        Err(status_error(status, format!("{context}: {body}")).into())
    }

    /// Fetches every item of a HAL collection, following `page_count`
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        embedded_key: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.study_url(path);
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut params: Vec<(&str, String)> = query.to_vec();
            params.push(("page", page.to_string()));
            params.push(("page_size", self.config.page_size.to_string()));

            let response = self
                .send(self.client.get(&url).query(&params), path)
                .await?;
            let body: HalPage = response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))?;

            if let Some(serde_json::Value::Array(values)) = body.embedded.get(embedded_key) {
                for value in values {
                    let item = serde_json::from_value(value.clone())
                        .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))?;
                    items.push(item);
                }
            }

            let page_count = body.page_count.unwrap_or(1);
            if page >= page_count {
                break;
            }
            page += 1;
        }

        tracing::debug!(path = %path, count = items.len(), "Fetched collection");
        Ok(items)
    }

    /// Fetches a CSV export and deserializes its rows by header name
    async fn get_csv_export<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response = self.send(self.client.get(self.study_url(path)), path).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))?;
        parse_export_csv(&body)
    }
}

/// Parses a `;`-delimited Castor CSV export
pub fn parse_export_csv<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .flexible(true)
        .from_reader(body.as_bytes());

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .map_err(CastorError::from)
}

/// Maps a non-success status to an API error
fn status_error(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthenticationFailed(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimitExceeded(message),
        s if s.is_server_error() => ApiError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => ApiError::ClientError {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl StudySource for CastorClient {
    fn study_id(&self) -> &str {
        &self.config.study_id
    }

    async fn fetch_structure(&self) -> Result<Vec<StructureRow>> {
        self.get_csv_export("export/structure").await
    }

    async fn fetch_data(&self) -> Result<Vec<DataRow>> {
        self.get_csv_export("export/data").await
    }

    async fn fetch_optiongroups(&self) -> Result<Vec<OptionGroup>> {
        let groups: Vec<OptionGroup> = self
            .get_paginated("field-optiongroup", "fieldOptionGroups", &[])
            .await?;
        // Options arrive in insertion order
        Ok(groups
            .into_iter()
            .map(|group| OptionGroup::new(group.id, group.name, group.options))
            .collect())
    }

    async fn fetch_field_dependencies(&self) -> Result<Vec<FieldDependencyModel>> {
        self.get_paginated("field-dependency", "fieldDependencies", &[])
            .await
    }

    async fn fetch_surveys(&self) -> Result<Vec<SurveyModel>> {
        self.get_paginated("survey", "surveys", &[]).await
    }

    async fn fetch_report_instances(&self, archived: bool) -> Result<Vec<ReportInstanceModel>> {
        let query = [("archived", if archived { "1" } else { "0" }.to_string())];
        self.get_paginated("report-instance", "reportInstances", &query)
            .await
    }

    async fn fetch_records(&self) -> Result<Vec<RecordModel>> {
        self.get_paginated("record", "records", &[]).await
    }

    async fn fetch_survey_package_instances(&self) -> Result<Vec<SurveyPackageInstanceModel>> {
        self.get_paginated("surveypackageinstance", "surveypackageinstance", &[])
            .await
    }

    async fn create_report_instance(
        &self,
        record_id: &str,
        report_id: &str,
        instance_name: &str,
    ) -> Result<String> {
        let path = format!("record/{record_id}/report-instance");
        let body = serde_json::json!({
            "report_id": report_id,
            "report_name_custom": instance_name,
        });
        let response = self
            .send(self.client.post(self.study_url(&path)).json(&body), &path)
            .await?;
        let created: CreatedInstance = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))?;

        tracing::debug!(
            record_id = %record_id,
            report_id = %report_id,
            instance_id = %created.id,
            "Created report instance"
        );
        Ok(created.id)
    }

    async fn post_field_values(
        &self,
        record_id: &str,
        target: &UploadTarget,
        values: &[FieldValuePost],
        change_reason: &str,
    ) -> Result<UploadResponse> {
        let path = match target {
            UploadTarget::Study => format!("record/{record_id}/data-point-collection/study"),
            UploadTarget::ReportInstance(instance_id) => {
                format!("record/{record_id}/data-point-collection/report-instance/{instance_id}")
            }
        };
        let body = serde_json::json!({
            "common": {
                "change_reason": change_reason,
                "confirmed_changes": true,
            },
            "data": values,
        });
        let response = self
            .send(self.client.post(self.study_url(&path)).json(&body), &path)
            .await?;
        let feedback = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{path}: {e}")))?;
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ApiError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            ApiError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new()),
            ApiError::ServerError { status: 502, .. }
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, String::new()),
            ApiError::ClientError { status: 422, .. }
        ));
    }

    #[test]
    fn test_parse_export_csv_with_bom() {
        let body = "\u{feff}Record ID;Form Type;Field ID;Value\n110001;Study;F1;42\n110002;;;\n";
        let rows: Vec<DataRow> = parse_export_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "42");
        assert!(rows[1].form_type.is_empty());
    }

    #[test]
    fn test_client_new_is_unauthenticated() {
        let client = CastorClient::new(CastorConfig {
            base_url: "https://data.castoredc.com/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(client.base_url(), "https://data.castoredc.com");
    }
}
