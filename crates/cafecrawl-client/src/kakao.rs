use cafecrawl_core::error::AppError;
use cafecrawl_core::models::{CAFE_CATEGORY_CODE, MAX_PAGE, PageQuery, RawPlace, SearchPage};
use cafecrawl_core::traits::PlaceSearch;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::config::KakaoConfig;

const CATEGORY_SEARCH_PATH: &str = "/v2/local/search/category.json";

/// Category search client for the Kakao Local API.
///
/// Every call is a single request: retries and pacing belong to the caller.
#[derive(Clone)]
pub struct KakaoClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl KakaoClient {
    pub fn new(config: KakaoConfig) -> Result<Self, AppError> {
        let config = config.validated()?;
        let client = Client::builder()
            .user_agent(concat!("cafecrawl/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{CATEGORY_SEARCH_PATH}", config.base_url),
            api_key: config.api_key,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::new(KakaoConfig::from_env()?)
    }
}

// ---- Kakao API types ----

#[derive(Deserialize)]
struct CategorySearchResponse {
    #[serde(default)]
    documents: Vec<RawPlace>,
    meta: Meta,
}

#[derive(Deserialize)]
struct Meta {
    is_end: bool,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

fn query_params(query: &PageQuery) -> [(&'static str, String); 7] {
    [
        ("category_group_code", CAFE_CATEGORY_CODE.to_string()),
        ("x", query.longitude.to_string()),
        ("y", query.latitude.to_string()),
        ("radius", query.radius.to_string()),
        ("page", query.page.to_string()),
        ("size", query.page_size.to_string()),
        ("sort", "distance".to_string()),
    ]
}

fn parse_page(body: &str) -> Result<SearchPage, AppError> {
    let response: CategorySearchResponse = serde_json::from_str(body)?;
    Ok(SearchPage {
        places: response.documents,
        is_end: response.meta.is_end,
    })
}

impl PlaceSearch for KakaoClient {
    async fn search_page(&self, query: &PageQuery) -> Result<SearchPage, AppError> {
        if query.page == 0 || query.page > MAX_PAGE {
            return Err(AppError::Generic(format!(
                "page {} outside 1..={MAX_PAGE}",
                query.page
            )));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("KakaoAK {}", self.api_key))
            .query(&query_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(AppError::HttpError { status, message });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::NetworkError(format!("Failed to read response body: {e}"))
            }
        })?;

        let page = parse_page(&body)?;
        tracing::debug!(
            page = query.page,
            places = page.places.len(),
            is_end = page.is_end,
            "Fetched search page"
        );
        Ok(page)
    }
}
