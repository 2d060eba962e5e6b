//! HTTP client for the TestRail API v2.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::TestManagement;
use super::error::{TestRailError, TestRailResult};
use super::types::{
    AddResultBody, CaseField, CategoryInfo, NewResult, PlanLookup, PlanResponse, ResultRecord,
    StatusInfo, User, parse_dropdown_items,
};
use crate::core::config::TestRailSettings;
use crate::core::models::{RunId, RunInfo, TestCase};

/// User agent for TestRail requests.
const USER_AGENT_VALUE: &str = concat!("glados/", env!("CARGO_PKG_VERSION"));

/// Name of the custom case field holding test categories.
const CATEGORY_FIELD: &str = "custom_test_category";

/// TestRail client speaking the JSON API with basic authentication.
#[derive(Debug)]
pub struct HttpTestRail {
    client: reqwest::Client,
    base_url: String,
    user: String,
    api_key: String,
    automation_user: OnceCell<u64>,
}

impl HttpTestRail {
    /// Create a client from the `[testrail]` settings.
    pub fn new(settings: &TestRailSettings) -> TestRailResult<Self> {
        if settings.url.trim().is_empty() {
            return Err(TestRailError::Config {
                message: "TestRail URL is not set".to_string(),
            });
        }
        if settings.user.is_empty() || settings.api_key.is_empty() {
            return Err(TestRailError::Config {
                message: "TestRail user and API key are required".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| TestRailError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        // Normalize base URL (remove trailing slash)
        let base_url = settings.url.trim_end_matches('/').to_string();

        let automation_user = OnceCell::new_with(settings.automation_user_id);

        Ok(Self {
            client,
            base_url,
            user: settings.user.clone(),
            api_key: settings.api_key.clone(),
            automation_user,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, path)
    }

    /// Sends a request and returns the raw response without status checks.
    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<Value>,
    ) -> TestRailResult<reqwest::Response> {
        debug!(method = %method, url = %url, "testrail request");
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.api_key));
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    /// Maps non-success statuses to errors.
    async fn check(response: reqwest::Response, resource: &str) -> TestRailResult<reqwest::Response> {
        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response),
            401 => Err(TestRailError::Unauthorized {
                message: error_message(response).await,
            }),
            404 => Err(TestRailError::NotFound {
                resource: resource.to_string(),
            }),
            code => Err(TestRailError::Api {
                status: code,
                message: error_message(response).await,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> TestRailResult<T> {
        let url = self.endpoint(path);
        let response = self.send(reqwest::Method::GET, &url, None).await?;
        let response = Self::check(response, path).await?;
        Ok(response.json::<T>().await?)
    }

    /// Fetches a list endpoint. Older TestRail versions return a bare array;
    /// newer ones wrap it as `{ "<key>": [...], "_links": { "next": ... } }`.
    async fn get_list<T: DeserializeOwned>(&self, path: &str, key: &str) -> TestRailResult<Vec<T>> {
        let mut items = Vec::new();
        let mut url = self.endpoint(path);

        loop {
            let response = self.send(reqwest::Method::GET, &url, None).await?;
            let body: Value = Self::check(response, path).await?.json().await?;
            let (page, next) = split_page(body, key)?;
            for item in page {
                items.push(serde_json::from_value(item)?);
            }
            match next {
                Some(next) => {
                    url = format!("{}/index.php?/{}", self.base_url, next.trim_start_matches('/'))
                }
                None => break,
            }
        }

        Ok(items)
    }

    async fn automation_user_id(&self) -> TestRailResult<u64> {
        self.automation_user
            .get_or_try_init(|| async {
                let path = format!(
                    "get_user_by_email&email={}",
                    urlencoding::encode(&self.user)
                );
                let user: User = self.get_json(&path).await?;
                Ok::<u64, TestRailError>(user.id)
            })
            .await
            .copied()
    }
}

fn split_page(body: Value, key: &str) -> TestRailResult<(Vec<Value>, Option<String>)> {
    match body {
        Value::Array(items) => Ok((items, None)),
        Value::Object(mut map) => {
            let next = map
                .get("_links")
                .and_then(|links| links.get("next"))
                .and_then(Value::as_str)
                .map(str::to_string);
            match map.remove(key) {
                Some(Value::Array(items)) => Ok((items, next)),
                _ => Err(TestRailError::InvalidResponse {
                    message: format!("expected a list under `{}`", key),
                }),
            }
        }
        _ => Err(TestRailError::InvalidResponse {
            message: format!("expected a list of {}", key),
        }),
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}

#[async_trait]
impl TestManagement for HttpTestRail {
    async fn get_run(&self, run_id: RunId) -> TestRailResult<RunInfo> {
        self.get_json(&format!("get_run/{}", run_id)).await
    }

    async fn get_plan_runs(&self, id: RunId) -> TestRailResult<PlanLookup> {
        let path = format!("get_plan/{}", id);
        let url = self.endpoint(&path);
        let response = self.send(reqwest::Method::GET, &url, None).await?;

        // TestRail answers 400 for ids that are not plans; 403/404 are treated
        // the same way so the id is retried as a literal run.
        if matches!(response.status().as_u16(), 400 | 403 | 404) {
            debug!(id, status = %response.status(), "identifier is not a plan");
            return Ok(PlanLookup::NotAPlan);
        }

        let plan: PlanResponse = Self::check(response, &path).await?.json().await?;
        let runs = plan
            .entries
            .into_iter()
            .flat_map(|entry| entry.runs)
            .map(|run| run.id)
            .collect();
        Ok(PlanLookup::Plan(runs))
    }

    async fn get_tests(&self, run_id: RunId) -> TestRailResult<Vec<TestCase>> {
        self.get_list(&format!("get_tests/{}", run_id), "tests").await
    }

    async fn add_result(&self, result: &NewResult) -> TestRailResult<()> {
        let path = format!("add_result_for_case/{}/{}", result.run_id, result.case_id);
        let url = self.endpoint(&path);
        let body = serde_json::to_value(AddResultBody::from(result))?;
        let response = self.send(reqwest::Method::POST, &url, Some(body)).await?;
        Self::check(response, &path).await?;
        debug!(
            run_id = result.run_id,
            case_id = result.case_id,
            status_id = result.status_id,
            "posted result"
        );
        Ok(())
    }

    async fn get_statuses(&self) -> TestRailResult<Vec<StatusInfo>> {
        self.get_json("get_statuses").await
    }

    async fn get_test_categories(&self) -> TestRailResult<Vec<CategoryInfo>> {
        let fields: Vec<CaseField> = self.get_json("get_case_fields").await?;
        let field = fields.into_iter().find(|f| {
            f.system_name == CATEGORY_FIELD
                || f.system_name == CATEGORY_FIELD.trim_start_matches("custom_")
        });

        let Some(field) = field else {
            warn!(field = CATEGORY_FIELD, "case field not found, no categories available");
            return Ok(Vec::new());
        };

        let mut categories: Vec<CategoryInfo> = Vec::new();
        for config in field.configs {
            if let Some(items) = config.options.items.as_deref() {
                for category in parse_dropdown_items(items) {
                    if !categories.iter().any(|c| c.id == category.id) {
                        categories.push(category);
                    }
                }
            }
        }
        Ok(categories)
    }

    async fn get_manual_final_results(&self, run_id: RunId) -> TestRailResult<HashSet<u64>> {
        let automation_user = self.automation_user_id().await?;
        let records: Vec<ResultRecord> = self
            .get_list(&format!("get_results_for_run/{}", run_id), "results")
            .await?;

        let mut latest: HashMap<u64, &ResultRecord> = HashMap::new();
        for record in &records {
            latest
                .entry(record.test_id)
                .and_modify(|current| {
                    if record.created_on > current.created_on {
                        *current = record;
                    }
                })
                .or_insert(record);
        }

        Ok(latest
            .into_values()
            .filter(|record| record.created_by.is_some_and(|by| by != automation_user))
            .map(|record| record.test_id)
            .collect())
    }
}
