//! HTTP client for the log/ACL backend.

use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::acl::{AclListing, AclSubmission, DeleteAclForm};
use crate::logs::LogsPage;

/// Backend call failures.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
struct LogsRequest {
    date: NaiveDate,
    page: u32,
}

/// Client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct Backend {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl Backend {
    /// `timeout` of `None` lets requests wait indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Page navigation target for the daily report.
    pub fn report_url(&self, date: NaiveDate) -> String {
        self.url(&format!("/reports/date/{}", date.format("%Y-%m-%d")))
    }

    /// `POST /get-logs-by-date`.
    pub async fn fetch_users_page(&self, date: NaiveDate, page: u32) -> Result<LogsPage, BackendError> {
        let response = self
            .client
            .post(self.url("/get-logs-by-date"))
            .json(&LogsRequest { date, page })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = check_status(response)?;
        response
            .json::<LogsPage>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// `GET /admin/acls` as JSON.
    pub async fn list_acls(&self) -> Result<AclListing, BackendError> {
        let response = self
            .client
            .get(self.url("/admin/acls"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = check_status(response)?;
        response
            .json::<AclListing>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Form post to `/admin/acls/add` or `/admin/acls/edit`.
    pub async fn submit_acl(&self, submission: &AclSubmission) -> Result<(), BackendError> {
        self.post_form(submission.endpoint(), &submission.form_fields())
            .await
    }

    /// Form post to `/admin/acls/delete`.
    pub async fn delete_acl(&self, form: &DeleteAclForm) -> Result<(), BackendError> {
        self.post_form("/admin/acls/delete", form).await
    }

    async fn post_form<T: Serialize + ?Sized>(&self, path: &str, form: &T) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        check_status(response)?;
        Ok(())
    }

    fn classify(&self, e: reqwest::Error) -> BackendError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => BackendError::Timeout(timeout),
            _ => BackendError::Network(e.to_string()),
        }
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status(status.as_u16()))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{spawn, FakeBackend};
    use super::*;
    use crate::acl::{AclForm, AclFormFields};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_users_page() {
        let fake = FakeBackend::default();
        let backend = Backend::new(&spawn(fake.clone()).await, None).unwrap();

        let page = backend.fetch_users_page(date("2024-05-01"), 2).await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.users[0].username, "alice");

        let sent = fake.log_requests.lock().unwrap()[0].clone();
        assert_eq!(sent["date"], "2024-05-01");
        assert_eq!(sent["page"], 2);
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let backend = Backend::new(&spawn(FakeBackend::default()).await, None).unwrap();
        let err = backend.fetch_users_page(date("1999-01-01"), 1).await.unwrap_err();
        assert!(matches!(err, BackendError::Status(500)));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let backend = Backend::new("http://127.0.0.1:1", Some(Duration::from_millis(500))).unwrap();
        let err = backend.fetch_users_page(date("2024-05-01"), 1).await.unwrap_err();
        assert!(matches!(err, BackendError::Network(_) | BackendError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_acl_round_trips() {
        let fake = FakeBackend::default();
        let backend = Backend::new(&spawn(fake.clone()).await, None).unwrap();

        let listing = backend.list_acls().await.unwrap();
        assert_eq!(listing.csrf_token, "csrf-123");
        assert_eq!(listing.acls.len(), 1);

        let mut form = AclForm::new_add();
        form.apply_fields(AclFormFields {
            name: "ports".to_string(),
            acl_type: "port".to_string(),
            values: vec!["80".to_string(), "443".to_string()],
            options: vec![],
            comment: String::new(),
        });
        backend.submit_acl(&form.to_submission().unwrap()).await.unwrap();

        backend
            .delete_acl(&DeleteAclForm {
                csrf_token: listing.csrf_token.clone(),
                id: 0,
            })
            .await
            .unwrap();

        let posts = fake.form_posts.lock().unwrap();
        assert_eq!(posts[0].0, "add");
        assert!(posts[0].1.contains("values%5B%5D=80&values%5B%5D=443"));
        assert_eq!(posts[1], ("delete".to_string(), "csrf_token=csrf-123&id=0".to_string()));
    }

    #[test]
    fn test_urls() {
        let backend = Backend::new("http://backend:5000/", None).unwrap();
        assert_eq!(backend.url("/admin/acls"), "http://backend:5000/admin/acls");
        assert_eq!(
            backend.report_url(date("2024-02-29")),
            "http://backend:5000/reports/date/2024-02-29"
        );
    }
}
