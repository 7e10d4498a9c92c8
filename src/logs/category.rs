//! HTTP status code buckets.

use serde::{Deserialize, Serialize};

use super::LogEntry;

/// Bucket an HTTP status code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCategory {
    Informational,
    Successful,
    Redirection,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusCategory {
    /// All categories in display order.
    pub const ALL: [StatusCategory; 6] = [
        StatusCategory::Informational,
        StatusCategory::Successful,
        StatusCategory::Redirection,
        StatusCategory::ClientError,
        StatusCategory::ServerError,
        StatusCategory::Unknown,
    ];

    /// Classify a status code. Ranges are inclusive and do not overlap.
    pub fn from_code(code: u16) -> Self {
        match code {
            100..=199 => StatusCategory::Informational,
            200..=299 => StatusCategory::Successful,
            300..=399 => StatusCategory::Redirection,
            400..=499 => StatusCategory::ClientError,
            500..=599 => StatusCategory::ServerError,
            _ => StatusCategory::Unknown,
        }
    }

    /// Stable key used in URLs and `data-filter-type` attributes.
    pub fn key(self) -> &'static str {
        match self {
            StatusCategory::Informational => "informational",
            StatusCategory::Successful => "successful",
            StatusCategory::Redirection => "redirection",
            StatusCategory::ClientError => "clientError",
            StatusCategory::ServerError => "serverError",
            StatusCategory::Unknown => "unknown",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Informational => "Informational responses (100–199)",
            StatusCategory::Successful => "Successful responses (200–299)",
            StatusCategory::Redirection => "Redirection messages (300–399)",
            StatusCategory::ClientError => "Client error responses (400–499)",
            StatusCategory::ServerError => "Server error responses (500–599)",
            StatusCategory::Unknown => "Other",
        }
    }

    /// Font Awesome icon for the filter chip.
    pub fn icon(self) -> &'static str {
        match self {
            StatusCategory::Informational => "fa-info-circle",
            StatusCategory::Successful => "fa-circle-check",
            StatusCategory::Redirection => "fa-arrow-right",
            StatusCategory::ClientError => "fa-circle-xmark",
            StatusCategory::ServerError => "fa-triangle-exclamation",
            StatusCategory::Unknown => "fa-question",
        }
    }

    /// Text colour class of the filter chip.
    pub fn color_class(self) -> &'static str {
        match self {
            StatusCategory::Informational => "text-blue-500",
            StatusCategory::Successful => "text-green-500",
            StatusCategory::Redirection => "text-yellow-500",
            StatusCategory::ClientError => "text-red-500",
            StatusCategory::ServerError => "text-orange-400",
            StatusCategory::Unknown => "text-gray-500",
        }
    }

    /// Background class of the status badge on a log row.
    pub fn badge_class(self) -> &'static str {
        match self {
            StatusCategory::Informational => "bg-blue-400",
            StatusCategory::Successful => "bg-green-500",
            StatusCategory::Redirection => "bg-yellow-400",
            StatusCategory::ClientError => "bg-red-500",
            StatusCategory::ServerError => "bg-orange-400",
            StatusCategory::Unknown => "bg-gray-400",
        }
    }
}

/// Number of raw entries per category, in display order. Categories with no
/// entries are omitted.
pub fn category_counts(logs: &[LogEntry]) -> Vec<(StatusCategory, usize)> {
    let mut counts = [0usize; StatusCategory::ALL.len()];
    for log in logs {
        let category = StatusCategory::from_code(log.response);
        counts[category as usize] += 1;
    }

    StatusCategory::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(response: u16) -> LogEntry {
        LogEntry {
            url: "a".to_string(),
            response,
            request_count: 1,
            data_transmitted: 1,
        }
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(StatusCategory::from_code(0), StatusCategory::Unknown);
        assert_eq!(StatusCategory::from_code(99), StatusCategory::Unknown);
        assert_eq!(StatusCategory::from_code(100), StatusCategory::Informational);
        assert_eq!(StatusCategory::from_code(199), StatusCategory::Informational);
        assert_eq!(StatusCategory::from_code(200), StatusCategory::Successful);
        assert_eq!(StatusCategory::from_code(299), StatusCategory::Successful);
        assert_eq!(StatusCategory::from_code(300), StatusCategory::Redirection);
        assert_eq!(StatusCategory::from_code(399), StatusCategory::Redirection);
        assert_eq!(StatusCategory::from_code(400), StatusCategory::ClientError);
        assert_eq!(StatusCategory::from_code(499), StatusCategory::ClientError);
        assert_eq!(StatusCategory::from_code(500), StatusCategory::ServerError);
        assert_eq!(StatusCategory::from_code(599), StatusCategory::ServerError);
        assert_eq!(StatusCategory::from_code(600), StatusCategory::Unknown);
    }

    #[test]
    fn test_key_roundtrip() {
        for category in StatusCategory::ALL {
            assert_eq!(StatusCategory::from_key(category.key()), Some(category));
        }
        assert_eq!(StatusCategory::from_key("teapot"), None);
    }

    #[test]
    fn test_category_counts() {
        let logs = vec![entry(200), entry(204), entry(404), entry(0)];
        let counts = category_counts(&logs);
        assert_eq!(
            counts,
            vec![
                (StatusCategory::Successful, 2),
                (StatusCategory::ClientError, 1),
                (StatusCategory::Unknown, 1),
            ]
        );
    }
}
