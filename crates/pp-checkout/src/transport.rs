use std::collections::BTreeMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{constants::INDEX_PARAM, error::FetchError};

/// Form fields sent with a pickup list request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchParams(BTreeMap<String, String>);

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// These params plus the shipping method index, which wins over any
    /// `index` field already present.
    pub fn with_index(mut self, index: &str) -> Self {
        self.insert(INDEX_PARAM, index);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FetchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Outbound channel used to fetch rendered pickup lists.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// POST `params` form-encoded to `url` and return the response body.
    async fn post_form(&self, url: &str, params: &FetchParams) -> Result<String, FetchError>;
}

pub fn default_http_client() -> Client {
    Client::builder()
        .gzip(true)
        .brotli(true)
        .build()
        .unwrap_or_default()
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(default_http_client())
    }
}

impl Transport for HttpTransport {
    async fn post_form(&self, url: &str, params: &FetchParams) -> Result<String, FetchError> {
        let response = self.client.post(url).form(params).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::ResponseError(response.status()));
        }
        response.text().await.map_err(FetchError::ResponseBodyError)
    }
}
