//! Thin client for the Redash REST API.
//!
//! One [`Client`] is built when the provider is configured and shared
//! read-only by every resource. Calls are one request per operation,
//! no retries: errors are surfaced to the caller untouched.

use reqwest::{header, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

mod dashboard;
mod query;
mod visualization;
mod widget;

pub use dashboard::{Dashboard, DashboardCreatePayload, DashboardUpdatePayload};
pub use query::{
    ParameterValue, Query, QueryCreatePayload, QueryOptions, QueryParameter, QuerySchedule,
    QueryUpdatePayload, ValueRange,
};
pub use visualization::{
    ChartLegend, ChartOptions, ChartSeries, ChartSeriesOptions, ChartXAxis, ChartXAxisLabels,
    ChartYAxis, ColumnOptions, TableOptions, Visualization, VisualizationCreatePayload,
    VisualizationOptions, VisualizationUpdatePayload, TYPE_CHART, TYPE_TABLE,
};
pub use widget::{
    ParameterMapping, Widget, WidgetCreatePayload, WidgetOptions, WidgetPosition,
    WidgetUpdatePayload,
};

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid Redash endpoint `{0}`")]
    Endpoint(String),
    #[error("the API key contains characters that cannot be sent in a header")]
    ApiKey,
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Redash returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
}

impl Client {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let mut base = Url::parse(endpoint).map_err(|_| Error::Endpoint(endpoint.to_owned()))?;
        if base.cannot_be_a_base() {
            return Err(Error::Endpoint(endpoint.to_owned()));
        }
        // Url::join drops the last path segment unless it ends with `/`.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let mut auth =
            header::HeaderValue::from_str(&format!("Key {api_key}")).map_err(|_| Error::ApiKey)?;
        auth.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base })
    }

    /// Normalized base URL the client talks to.
    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|_| Error::Endpoint(path.to_owned()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path)?;
        debug!("POST {url}");
        let response = self.http.post(url).json(body).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        debug!("DELETE {url}");
        let response = self.http.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into an [`Error::Status`] carrying the body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Status { status, url, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_bad_endpoints() {
        assert!(matches!(
            Client::new("not a url", "key"),
            Err(Error::Endpoint(_))
        ));
        assert!(matches!(
            Client::new("mailto:nobody", "key"),
            Err(Error::Endpoint(_))
        ));
        assert!(Client::new("https://redash.example.com/", "key").is_ok());
    }

    #[test]
    fn it_rejects_unsendable_api_keys() {
        assert!(matches!(
            Client::new("https://redash.example.com/", "bad\nkey"),
            Err(Error::ApiKey)
        ));
    }
}
