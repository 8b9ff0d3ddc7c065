//! HTTP client wrapper for interacting with CouchDB.

use crate::config::get_config;
use crate::couch::types::{CouchError, FindResponse, SortDirection, WriteResponse};
use crate::roster::Student;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Page size used when walking `_find` results with bookmarks.
const FIND_PAGE_LIMIT: usize = 512;

/// Lightweight HTTP client for CouchDB operations, scoped to student documents.
pub struct CouchStore {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) database: String,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
}

impl CouchStore {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, CouchError> {
        let config = get_config();
        let client = Client::builder().user_agent("rosterd/0.1").build()?;

        let base_url = normalize_base_url(&config.couchdb_url).map_err(CouchError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            database = %config.couchdb_database,
            has_credentials = config.couchdb_username.is_some(),
            "Initialized CouchDB HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            database: config.couchdb_database.clone(),
            username: config.couchdb_username.clone(),
            password: config.couchdb_password.clone(),
        })
    }

    /// Create the backing database when it is missing.
    pub async fn ensure_database(&self) -> Result<(), CouchError> {
        let response = self.request(Method::PUT, &self.database).send().await?;

        match response.status() {
            StatusCode::CREATED => {
                tracing::debug!(database = %self.database, "Database created");
                Ok(())
            }
            StatusCode::PRECONDITION_FAILED => {
                tracing::debug!(database = %self.database, "Database already exists");
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = CouchError::UnexpectedStatus { status, body };
                tracing::error!(database = %self.database, error = %error, "Failed to ensure database");
                Err(error)
            }
        }
    }

    /// Ensure the Mango index backing sorted listings exists.
    ///
    /// Creating an index is idempotent: CouchDB reports `exists` instead of
    /// failing when it is already present.
    pub async fn ensure_sort_index(&self) -> Result<(), CouchError> {
        let body = json!({
            "index": { "fields": ["lastName"] },
            "ddoc": "roster-indexes",
            "name": "lastname-sort",
            "type": "json",
        });

        let response = self
            .request(Method::POST, &format!("{}/_index", self.database))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(database = %self.database, index = "lastname-sort", "Sort index ensured");
        })
        .await
    }

    /// Fetch student documents via Mango `_find`, following bookmarks until
    /// the result set (or the requested limit) is exhausted.
    pub async fn find_students(
        &self,
        sort: Option<SortDirection>,
        limit: Option<usize>,
    ) -> Result<Vec<Student>, CouchError> {
        // A sorted query must mention the indexed field in its selector for
        // CouchDB to pick the lastName index.
        let selector = match sort {
            Some(_) => json!({ "lastName": { "$gt": null } }),
            None => json!({}),
        };

        let mut students: Vec<Student> = Vec::new();
        let mut bookmark: Option<String> = None;

        loop {
            let page_limit = match limit {
                Some(total) => (total - students.len()).min(FIND_PAGE_LIMIT),
                None => FIND_PAGE_LIMIT,
            };

            let mut body = json!({
                "selector": selector.clone(),
                "limit": page_limit,
            });
            let obj = body
                .as_object_mut()
                .expect("find body should remain an object");
            if let Some(direction) = sort {
                obj.insert("sort".into(), json!([{ "lastName": direction.as_str() }]));
            }
            if let Some(mark) = &bookmark {
                obj.insert("bookmark".into(), Value::String(mark.clone()));
            }

            let response = self
                .request(Method::POST, &format!("{}/_find", self.database))
                .json(&body)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = CouchError::UnexpectedStatus { status, body };
                tracing::error!(database = %self.database, error = %error, "Failed to query students");
                return Err(error);
            }

            let page: FindResponse = response.json().await?;
            let fetched = page.docs.len();
            students.extend(page.docs);

            if fetched < page_limit || limit.is_some_and(|total| students.len() >= total) {
                break;
            }
            match page.bookmark {
                Some(next) => bookmark = Some(next),
                None => break,
            }
        }

        Ok(students)
    }

    /// Fetch a single student document, returning `None` when absent.
    pub async fn get_student(&self, id: &str) -> Result<Option<Student>, CouchError> {
        let response = self
            .request(Method::GET, &format!("{}/{}", self.database, id))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = CouchError::UnexpectedStatus { status, body };
                tracing::error!(id, error = %error, "Student lookup failed");
                Err(error)
            }
        }
    }

    /// Write a student document, returning the revision CouchDB assigned.
    ///
    /// New documents carry no `_rev`; rewrites must carry the current one or
    /// CouchDB rejects the write with a conflict.
    pub async fn put_student(&self, student: &Student) -> Result<String, CouchError> {
        let response = self
            .request(Method::PUT, &format!("{}/{}", self.database, student.id))
            .json(student)
            .send()
            .await?;

        if response.status().is_success() {
            let write: WriteResponse = response.json().await?;
            tracing::debug!(id = %student.id, rev = %write.rev, "Student document written");
            Ok(write.rev)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = CouchError::UnexpectedStatus { status, body };
            tracing::error!(id = %student.id, error = %error, "Student write failed");
            Err(error)
        }
    }

    /// Hard-delete a student document at the given revision.
    pub async fn delete_student(&self, id: &str, rev: &str) -> Result<(), CouchError> {
        let response = self
            .request(Method::DELETE, &format!("{}/{}", self.database, id))
            .query(&[("rev", rev)])
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(id, "Student document deleted");
        })
        .await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(username) = &self.username
            && !username.is_empty()
        {
            req = req.basic_auth(username, self.password.as_deref());
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), CouchError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = CouchError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "CouchDB request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
