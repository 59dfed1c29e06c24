//! `/products/*` endpoints

use reqwest::Method;

use super::{ApiClient, ApiResponse, Endpoint, Payload, Session};
use crate::error::E2eResult;

pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn by_category(&self, category: Option<&str>, page: Option<i64>) -> E2eResult<ApiResponse> {
        self.get(category_endpoint(category, page)).await
    }

    pub async fn by_keyword(&self, keyword: Option<&str>, page: Option<i64>) -> E2eResult<ApiResponse> {
        self.get(keyword_endpoint(keyword, page)).await
    }

    /// `id` is text so malformed ids can be sent as-is
    pub async fn by_id(&self, id: Option<&str>) -> E2eResult<ApiResponse> {
        self.get(details_endpoint(id)).await
    }

    async fn get(&self, endpoint: Endpoint) -> E2eResult<ApiResponse> {
        self.client
            .send(Method::GET, &endpoint, &Session::Anonymous, Payload::Empty)
            .await
    }
}

fn with_page(endpoint: Endpoint, page: Option<i64>) -> Endpoint {
    match page {
        Some(page) => endpoint.param("paging", page),
        None => endpoint,
    }
}

pub fn category_endpoint(category: Option<&str>, page: Option<i64>) -> Endpoint {
    let path = match category {
        Some(category) => format!("products/{}", category),
        None => "products/".to_string(),
    };
    with_page(Endpoint::new(path), page)
}

pub fn keyword_endpoint(keyword: Option<&str>, page: Option<i64>) -> Endpoint {
    let endpoint = Endpoint::new("products/search");
    let endpoint = match keyword {
        Some(keyword) => endpoint.param("keyword", keyword),
        None => endpoint,
    };
    with_page(endpoint, page)
}

pub fn details_endpoint(id: Option<&str>) -> Endpoint {
    let endpoint = Endpoint::new("products/details/");
    match id {
        Some(id) => endpoint.param("id", id),
        None => endpoint,
    }
}
