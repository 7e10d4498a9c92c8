//! Log payload types as delivered by the backend.

use serde::{Deserialize, Deserializer, Serialize};

/// One aggregated access log line for a user on a reporting date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub url: String,
    /// Zero when the backend has no code, which categorizes as unknown.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_transmitted: u64,
}

/// Activity summary for one user on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_requests: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_data: u64,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// One page of users returned by `POST /get-logs-by-date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsPage {
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

/// Nullable database columns arrive as JSON `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_total_pages() -> u32 {
    1
}

fn default_page() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_logs_page() {
        let body = r#"{
            "users": [{
                "username": "alice",
                "ip": "10.0.0.7",
                "total_requests": 12,
                "total_data": 4096,
                "logs": [
                    {"url": "example.com:443", "response": 200, "request_count": 10, "data_transmitted": 4000},
                    {"url": "example.com:443", "response": 503, "request_count": 2, "data_transmitted": 96}
                ]
            }],
            "total": 31,
            "total_pages": 3,
            "page": 2
        }"#;

        let page: LogsPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total, 31);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.users[0].logs.len(), 2);
        assert_eq!(page.users[0].logs[1].response, 503);
    }

    #[test]
    fn test_decode_null_columns() {
        let body = r#"{
            "users": [{
                "username": "carol",
                "ip": null,
                "total_requests": null,
                "total_data": 300,
                "logs": [
                    {"url": "a.com", "response": null, "request_count": 3, "data_transmitted": 300},
                    {"url": "b.com", "response": 200, "request_count": null, "data_transmitted": null}
                ]
            }],
            "total": 1,
            "total_pages": 1,
            "page": 1
        }"#;

        let page: LogsPage = serde_json::from_str(body).unwrap();
        let user = &page.users[0];
        assert_eq!(user.ip, "");
        assert_eq!(user.total_requests, 0);
        assert_eq!(user.logs[0].response, 0);
        assert_eq!(user.logs[1].request_count, 0);
        assert_eq!(user.logs[1].data_transmitted, 0);
        assert_eq!(
            crate::logs::StatusCategory::from_code(user.logs[0].response),
            crate::logs::StatusCategory::Unknown
        );
    }

    #[test]
    fn test_decode_sparse_page() {
        let page: LogsPage = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.users.is_empty());
    }
}
