//! REST client for the word-list service
//!
//! [`WordService`] is the seam between the browse controller and the
//! network; [`ApiClient`] implements it over HTTP with JSON bodies.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::import::CsvUpload;
use crate::models::{
    Dictionary, MetaWord, NewDictionary, SearchPage, WordEntry, WordListProcessResult,
};
use crate::resolver::WordQuery;
use crate::{Error, Result};

/// Longest response body echoed into debug logs
const LOG_BODY_LIMIT: usize = 512;

/// Operations the browse view and admin tools need from the service
#[async_trait]
pub trait WordService: Send + Sync {
    async fn list_dictionaries(&self) -> Result<Vec<Dictionary>>;

    /// One page of meta-words matching a keyword prefix, optionally
    /// restricted to a dictionary
    async fn search_words(&self, query: &WordQuery) -> Result<SearchPage>;

    async fn get_word(&self, id: i64) -> Result<MetaWord>;

    async fn create_dictionary(&self, dictionary: &NewDictionary) -> Result<Dictionary>;

    /// Fails with a 400 [`Error::Api`] for imported dictionaries
    async fn delete_dictionary(&self, id: i64) -> Result<()>;

    async fn bulk_add_words(
        &self,
        dictionary_id: i64,
        entries: &[WordEntry],
    ) -> Result<WordListProcessResult>;

    async fn import_csv(
        &self,
        dictionary_id: i64,
        upload: &CsvUpload,
        has_header: bool,
    ) -> Result<WordListProcessResult>;
}

/// Request body of the paginated search endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    keyword: &'a str,
    dictionary_id: Option<i64>,
    page: u32,
    size: u32,
}

impl<'a> From<&'a WordQuery> for SearchRequest<'a> {
    fn from(query: &'a WordQuery) -> Self {
        Self {
            keyword: &query.keyword,
            dictionary_id: query.dictionary_scope,
            page: query.page_index(),
            size: query.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
struct AddWordListRequest<'a> {
    words: &'a [WordEntry],
}

/// Error payload returned by the service
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// HTTP implementation of [`WordService`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request and return the body of a successful response
    ///
    /// Non-2xx responses become [`Error::Api`] carrying the service's
    /// `message` field when it sent one.
    async fn execute(&self, request: RequestBuilder, label: &str) -> Result<String> {
        log::debug!("[api] {}", label);

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        log::debug!(
            "[api] {} -> {}: {}",
            label,
            status.as_u16(),
            truncate_for_log(&body)
        );

        if !status.is_success() {
            return Err(api_error(status, body));
        }

        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        label: &str,
    ) -> Result<T> {
        let body = self.execute(request, label).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WordService for ApiClient {
    async fn list_dictionaries(&self) -> Result<Vec<Dictionary>> {
        let url = self.endpoint("dictionaries")?;
        self.execute_json(self.http.get(url), "GET dictionaries")
            .await
    }

    async fn search_words(&self, query: &WordQuery) -> Result<SearchPage> {
        let url = self.endpoint("meta-words/search")?;
        let body = SearchRequest::from(query);
        let label = format!(
            "POST meta-words/search keyword={:?} dictionary={:?} page={}",
            query.keyword,
            query.dictionary_scope,
            query.page_index()
        );
        self.execute_json(self.http.post(url).json(&body), &label)
            .await
    }

    async fn get_word(&self, id: i64) -> Result<MetaWord> {
        let url = self.endpoint(&format!("meta-words/{}", id))?;
        self.execute_json(self.http.get(url), &format!("GET meta-words/{}", id))
            .await
    }

    async fn create_dictionary(&self, dictionary: &NewDictionary) -> Result<Dictionary> {
        dictionary.validate()?;
        let url = self.endpoint("dictionaries")?;
        let created: Dictionary = self
            .execute_json(self.http.post(url).json(dictionary), "POST dictionaries")
            .await?;
        log::info!("Created dictionary {} ({})", created.name, created.id);
        Ok(created)
    }

    async fn delete_dictionary(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&format!("dictionaries/{}", id))?;
        self.execute(self.http.delete(url), &format!("DELETE dictionaries/{}", id))
            .await?;
        log::info!("Deleted dictionary {}", id);
        Ok(())
    }

    async fn bulk_add_words(
        &self,
        dictionary_id: i64,
        entries: &[WordEntry],
    ) -> Result<WordListProcessResult> {
        let path = format!("dictionary-words/{}/words/list", dictionary_id);
        let url = self.endpoint(&path)?;
        let body = AddWordListRequest { words: entries };
        self.execute_json(self.http.post(url).json(&body), &format!("POST {}", path))
            .await
    }

    async fn import_csv(
        &self,
        dictionary_id: i64,
        upload: &CsvUpload,
        has_header: bool,
    ) -> Result<WordListProcessResult> {
        let path = format!("dictionary-words/{}/words/import-csv", dictionary_id);
        let url = self.endpoint(&path)?;
        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str("text/csv")?;
        let form = Form::new()
            .part("file", part)
            .text("hasHeader", has_header.to_string());
        self.execute_json(self.http.post(url).multipart(form), &format!("POST {}", path))
            .await
    }
}

/// Map a non-2xx response to [`Error::Api`]
///
/// The service's JSON `message` field is preferred; any other body is kept
/// as-is.
fn api_error(status: StatusCode, body: String) -> Error {
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

/// Truncate a response body for logging without splitting a character
fn truncate_for_log(body: &str) -> &str {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((cut, _)) => &body[..cut],
        None => body,
    }
}
