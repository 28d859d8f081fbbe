//! `{count, next, previous, results}` page envelope

use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::domain::{PageRequest, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(uri: &Uri, request: PageRequest, result: Paginated<T>) -> Self {
        let shown = request
            .index()
            .saturating_mul(request.limit)
            .saturating_add(result.items.len() as u64);
        let next = (shown < result.total && !result.items.is_empty())
            .then(|| page_link(uri, request.page.saturating_add(1)));
        let previous = (request.page > 1).then(|| page_link(uri, request.page - 1));

        Self {
            count: result.total,
            next,
            previous,
            results: result.items,
        }
    }
}

/// Same path and query with `page` replaced. Page 1 drops the parameter.
fn page_link(uri: &Uri, page: u64) -> String {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(
        uri.query().unwrap_or_default().as_bytes(),
    )
    .filter(|(k, _)| k != "page")
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect();

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.extend_pairs(pairs);
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    }
}
