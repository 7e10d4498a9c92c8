//! Aggregation of raw log entries into display rows.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::{LogEntry, StatusCategory};

/// How raw entries are partitioned into rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupPolicy {
    /// One row per URL. A row may mix status categories.
    ByUrl,
    /// One row per URL and status category, so a row never straddles two
    /// filter chips.
    #[default]
    ByUrlAndCategory,
}

/// An aggregated row for the log viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogGroup {
    pub url: String,
    /// Status code carrying the most requests within the group.
    pub response: u16,
    pub request_count: u64,
    pub data_transmitted: u64,
    pub is_grouped: bool,
}

impl LogGroup {
    pub fn category(&self) -> StatusCategory {
        StatusCategory::from_code(self.response)
    }

    /// Absolute link for the row. Bare `host:port` URLs get `https://` when
    /// the port is 443 or 8443.
    pub fn link(&self) -> String {
        if self.url.starts_with("http") {
            return self.url.clone();
        }

        static TLS_PORT: OnceLock<Regex> = OnceLock::new();
        let tls_port = TLS_PORT.get_or_init(|| Regex::new(r":(443|8443)$").expect("valid regex"));

        let scheme = if tls_port.is_match(&self.url) {
            "https://"
        } else {
            "http://"
        };
        format!("{}{}", scheme, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey<'a> {
    Url(&'a str),
    UrlAndCategory(&'a str, StatusCategory),
}

struct Accumulator<'a> {
    url: &'a str,
    /// Requests per status code, in first-seen order.
    responses: Vec<(u16, u64)>,
    request_count: u64,
    data_transmitted: u64,
    entries: usize,
}

impl<'a> Accumulator<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            responses: Vec::new(),
            request_count: 0,
            data_transmitted: 0,
            entries: 0,
        }
    }

    fn add(&mut self, log: &LogEntry) {
        self.request_count += log.request_count;
        self.data_transmitted += log.data_transmitted;
        self.entries += 1;

        match self.responses.iter_mut().find(|(code, _)| *code == log.response) {
            Some((_, count)) => *count += log.request_count,
            None => self.responses.push((log.response, log.request_count)),
        }
    }

    /// First code to reach the highest request total wins ties.
    fn dominant_response(&self) -> u16 {
        let mut best: Option<(u16, u64)> = None;
        for &(code, count) in &self.responses {
            match best {
                Some((_, max)) if count <= max => {}
                _ => best = Some((code, count)),
            }
        }
        best.map(|(code, _)| code).unwrap_or(0)
    }

    fn finish(self) -> LogGroup {
        LogGroup {
            url: self.url.to_string(),
            response: self.dominant_response(),
            request_count: self.request_count,
            data_transmitted: self.data_transmitted,
            is_grouped: self.entries > 1,
        }
    }
}

/// Group raw entries into rows, preserving the order in which each group was
/// first seen.
pub fn group_logs(logs: &[LogEntry], policy: GroupPolicy) -> Vec<LogGroup> {
    let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<Accumulator<'_>> = Vec::new();

    for log in logs {
        let key = match policy {
            GroupPolicy::ByUrl => GroupKey::Url(&log.url),
            GroupPolicy::ByUrlAndCategory => {
                GroupKey::UrlAndCategory(&log.url, StatusCategory::from_code(log.response))
            }
        };

        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Accumulator::new(&log.url));
            groups.len() - 1
        });
        groups[slot].add(log);
    }

    groups.into_iter().map(Accumulator::finish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, response: u16, request_count: u64, data_transmitted: u64) -> LogEntry {
        LogEntry {
            url: url.to_string(),
            response,
            request_count,
            data_transmitted,
        }
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            entry("a.com:443", 200, 5, 100),
            entry("b.com", 301, 1, 10),
            entry("a.com:443", 404, 9, 20),
            entry("a.com:443", 500, 2, 30),
            entry("c.net", 0, 3, 0),
            entry("a.com:443", 204, 1, 5),
            entry("b.com", 302, 4, 40),
        ]
    }

    #[test]
    fn test_sums_are_conserved() {
        let logs = sample();
        let raw_requests: u64 = logs.iter().map(|l| l.request_count).sum();
        let raw_data: u64 = logs.iter().map(|l| l.data_transmitted).sum();

        for policy in [GroupPolicy::ByUrl, GroupPolicy::ByUrlAndCategory] {
            let groups = group_logs(&logs, policy);
            assert_eq!(groups.iter().map(|g| g.request_count).sum::<u64>(), raw_requests);
            assert_eq!(groups.iter().map(|g| g.data_transmitted).sum::<u64>(), raw_data);
        }
    }

    #[test]
    fn test_category_partition() {
        let logs = vec![entry("a", 200, 1, 1), entry("a", 500, 1, 1)];

        let split = group_logs(&logs, GroupPolicy::ByUrlAndCategory);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].response, 200);
        assert_eq!(split[1].response, 500);
        assert!(!split[0].is_grouped);

        let merged = group_logs(&logs, GroupPolicy::ByUrl);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_grouped);
    }

    #[test]
    fn test_category_groups_never_mix_categories() {
        let logs = sample();
        let groups = group_logs(&logs, GroupPolicy::ByUrlAndCategory);

        for group in &groups {
            let members: Vec<_> = logs
                .iter()
                .filter(|l| {
                    l.url == group.url
                        && StatusCategory::from_code(l.response) == group.category()
                })
                .collect();
            assert!(!members.is_empty());
            assert_eq!(
                members.iter().map(|l| l.request_count).sum::<u64>(),
                group.request_count
            );
        }
    }

    #[test]
    fn test_dominant_response() {
        let logs = vec![entry("a", 200, 5, 0), entry("a", 404, 9, 0)];
        let groups = group_logs(&logs, GroupPolicy::ByUrl);
        assert_eq!(groups[0].response, 404);
    }

    #[test]
    fn test_dominant_response_counts_requests_not_entries() {
        let logs = vec![
            entry("a", 301, 1, 0),
            entry("a", 302, 10, 0),
            entry("a", 301, 1, 0),
        ];
        let groups = group_logs(&logs, GroupPolicy::ByUrlAndCategory);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].response, 302);
    }

    #[test]
    fn test_dominant_response_tie_keeps_first() {
        let logs = vec![entry("a", 201, 3, 0), entry("a", 200, 3, 0)];
        let groups = group_logs(&logs, GroupPolicy::ByUrl);
        assert_eq!(groups[0].response, 201);

        let zero = vec![entry("a", 204, 0, 0), entry("a", 200, 0, 0)];
        let groups = group_logs(&zero, GroupPolicy::ByUrl);
        assert_eq!(groups[0].response, 204);
    }

    #[test]
    fn test_is_grouped_flag() {
        let single = group_logs(&[entry("a", 200, 1, 1)], GroupPolicy::ByUrlAndCategory);
        assert!(!single[0].is_grouped);

        let double = group_logs(
            &[entry("a", 200, 1, 1), entry("a", 204, 1, 1)],
            GroupPolicy::ByUrlAndCategory,
        );
        assert_eq!(double.len(), 1);
        assert!(double[0].is_grouped);
    }

    #[test]
    fn test_first_seen_order() {
        let groups = group_logs(&sample(), GroupPolicy::ByUrl);
        let urls: Vec<_> = groups.iter().map(|g| g.url.as_str()).collect();
        assert_eq!(urls, vec!["a.com:443", "b.com", "c.net"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_logs(&[], GroupPolicy::ByUrlAndCategory).is_empty());
    }

    #[test]
    fn test_link_scheme() {
        let mut group = group_logs(&[entry("a.com:443", 200, 1, 1)], GroupPolicy::ByUrl).remove(0);
        assert_eq!(group.link(), "https://a.com:443");

        group.url = "a.com:8443".to_string();
        assert_eq!(group.link(), "https://a.com:8443");

        group.url = "a.com:80".to_string();
        assert_eq!(group.link(), "http://a.com:80");

        group.url = "a.com:4430".to_string();
        assert_eq!(group.link(), "http://a.com:4430");

        group.url = "https://a.com/x".to_string();
        assert_eq!(group.link(), "https://a.com/x");
    }
}
