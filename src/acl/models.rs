//! ACL payloads exchanged with the backend.

use serde::{Deserialize, Serialize};

/// Flags accepted before the ACL type on an `acl` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AclOption {
    /// `-i`: case-insensitive matching.
    #[serde(rename = "-i")]
    IgnoreCase,
    /// `-n`: skip DNS lookups.
    #[serde(rename = "-n")]
    NoDns,
    /// `-m`: match as substring.
    #[serde(rename = "-m")]
    Substring,
}

impl AclOption {
    pub const ALL: [AclOption; 3] = [AclOption::IgnoreCase, AclOption::NoDns, AclOption::Substring];

    pub fn flag(self) -> &'static str {
        match self {
            AclOption::IgnoreCase => "-i",
            AclOption::NoDns => "-n",
            AclOption::Substring => "-m",
        }
    }

    pub fn parse(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.flag() == flag.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            AclOption::IgnoreCase => "Case insensitive",
            AclOption::NoDns => "No DNS lookup",
            AclOption::Substring => "Substring match",
        }
    }
}

/// A configured ACL rule. The backend owns these; the id is its position in
/// the proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub acl_type: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Raw flags; unknown ones are ignored by the editor.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl AclRule {
    pub fn parsed_options(&self) -> Vec<AclOption> {
        let mut options: Vec<_> = self.options.iter().filter_map(|o| AclOption::parse(o)).collect();
        options.sort();
        options.dedup();
        options
    }
}

/// Response of the ACL listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclListing {
    #[serde(default)]
    pub acls: Vec<AclRule>,
    #[serde(default)]
    pub csrf_token: String,
}

/// Body of the delete form post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAclForm {
    pub csrf_token: String,
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_listing() {
        let body = r#"{
            "acls": [
                {"id": 0, "name": "localnet", "type": "src", "values": ["10.0.0.0/8"]},
                {"id": 1, "name": "social", "type": "dstdom_regex", "values": ["facebook"],
                 "options": ["-i", "-x", "-i"], "comment": "blocked at work"}
            ],
            "csrf_token": "tok"
        }"#;
        let listing: AclListing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.csrf_token, "tok");
        assert_eq!(listing.acls[0].acl_type, "src");
        assert!(listing.acls[0].options.is_empty());
        assert_eq!(listing.acls[1].parsed_options(), vec![AclOption::IgnoreCase]);
        assert_eq!(listing.acls[1].comment.as_deref(), Some("blocked at work"));
    }
}
