//! Canvas REST client.
//!
//! Thin bearer-auth wrapper over reqwest with page/per_page pagination. The
//! core calls it to fetch one read-only snapshot per run and to post grades
//! in live mode.

use crate::error::CanvasError;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{DiscussionEntry, DiscussionTopic, Student};

const CANVAS_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CANVAS_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Canvas REST API.
pub struct CanvasClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    per_page: usize,
}

impl CanvasClient {
    pub fn new(base_url: &str, api_key: &str, per_page: usize) -> Result<Self, CanvasError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CANVAS_HTTP_CONNECT_TIMEOUT)
            .timeout(CANVAS_HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CanvasError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            per_page,
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Fetch the discussion topic (title, prompt, assignment id).
    pub async fn get_discussion(
        &self,
        course_id: i64,
        discussion_id: i64,
    ) -> Result<DiscussionTopic, CanvasError> {
        info!(course_id, discussion_id, "Fetching discussion topic");
        let url = self.api_url(&format!(
            "courses/{}/discussion_topics/{}",
            course_id, discussion_id
        ));
        self.get_json(&url, &[]).await
    }

    /// Fetch the full student roster, with email and login_id included.
    pub async fn get_students(&self, course_id: i64) -> Result<Vec<Student>, CanvasError> {
        info!(course_id, "Fetching student roster");
        let url = self.api_url(&format!("courses/{}/students", course_id));
        let students = self
            .get_paginated(
                &url,
                &[
                    ("include[]".to_string(), "email".to_string()),
                    ("include[]".to_string(), "login_id".to_string()),
                ],
            )
            .await?;
        info!(count = students.len(), "Retrieved roster");
        Ok(students)
    }

    /// Fetch all entries (posts) in a discussion.
    pub async fn get_discussion_entries(
        &self,
        course_id: i64,
        discussion_id: i64,
    ) -> Result<Vec<DiscussionEntry>, CanvasError> {
        info!(course_id, discussion_id, "Fetching discussion entries");
        let url = self.api_url(&format!(
            "courses/{}/discussion_topics/{}/entries",
            course_id, discussion_id
        ));
        let entries = self.get_paginated(&url, &[]).await?;
        info!(count = entries.len(), "Retrieved discussion entries");
        Ok(entries)
    }

    /// Submit a grade (and optional comment) for an assignment submission.
    /// Graded discussions are graded through their backing assignment.
    pub async fn submit_grade(
        &self,
        course_id: i64,
        assignment_id: i64,
        user_id: i64,
        grade: &str,
        comment: Option<&str>,
    ) -> Result<(), CanvasError> {
        info!(user_id, grade, "Submitting grade");
        let url = self.api_url(&format!(
            "courses/{}/assignments/{}/submissions/{}",
            course_id, assignment_id, user_id
        ));

        let mut body = json!({
            "submission": { "posted_grade": grade }
        });
        if let Some(comment) = comment {
            body["comment"] = json!({ "text_comment": comment });
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, CanvasError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(map_http_error)?;

        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CanvasError::Json(e.to_string()))
    }

    /// Walk a paginated endpoint. Canvas caps per_page; the loop stops when a
    /// page comes back shorter than requested.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        base_query: &[(String, String)],
    ) -> Result<Vec<T>, CanvasError> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut query: Vec<(String, String)> = base_query.to_vec();
            query.push(("page".to_string(), page.to_string()));
            query.push(("per_page".to_string(), self.per_page.to_string()));

            debug!(url, page, "Fetching page");
            let batch: Vec<T> = self.get_json(url, &query).await?;
            let batch_len = batch.len();
            items.extend(batch);

            if batch_len < self.per_page {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CanvasError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status.as_u16(), body))
    }
}

fn map_status_error(status: u16, body: String) -> CanvasError {
    match status {
        401 => CanvasError::AuthFailed(body),
        404 => CanvasError::NotFound(body),
        429 => CanvasError::RateLimited(body),
        _ => CanvasError::Status { status, body },
    }
}

fn map_http_error(error: reqwest::Error) -> CanvasError {
    if error.is_timeout() {
        CanvasError::Request(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        CanvasError::Request(format!("Connection error: {}", error))
    } else {
        CanvasError::Request(format!("HTTP error: {}", error))
    }
}
