//! Reference metadata for the Squid ACL types offered by the editor.

use serde::Serialize;

/// Help shown next to the type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AclTypeInfo {
    pub tag: &'static str,
    pub group: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    /// Matching needs reverse DNS or an external helper.
    pub slow: bool,
}

impl AclTypeInfo {
    /// Icon classes of the speed hint.
    pub fn speed_icon(&self) -> &'static str {
        if self.slow {
            "fas fa-hourglass text-orange-600"
        } else {
            "fas fa-bolt text-green-600"
        }
    }
}

const fn info(
    tag: &'static str,
    group: &'static str,
    description: &'static str,
    example: &'static str,
    icon: &'static str,
    color: &'static str,
    slow: bool,
) -> AclTypeInfo {
    AclTypeInfo {
        tag,
        group,
        description,
        example,
        icon,
        color,
        slow,
    }
}

pub const ACL_TYPES: &[AclTypeInfo] = &[
    // Network / IP
    info("src", "Network / IP", "Client source IP. Single addresses, CIDR ranges or subnets.", "acl localnet src 192.168.1.0/24 10.0.0.0/8", "network-wired", "blue", false),
    info("dst", "Network / IP", "Destination IP (needs a reverse DNS lookup, can be slow).", "acl servers dst 10.0.0.5 10.0.0.6", "network-wired", "blue", true),
    info("localip", "Network / IP", "Local IP the client connected to.", "acl mypublic localip 203.0.113.45", "network-wired", "blue", false),
    info("src_as", "Network / IP", "Source Autonomous System number.", "acl my_as src_as 64512", "network-wired", "blue", false),
    info("dst_as", "Network / IP", "Destination Autonomous System number.", "acl cdn_nets dst_as 16509", "network-wired", "blue", false),
    // Domains
    info("dstdomain", "Domains", "Destination domain. A leading dot matches subdomains.", "acl allowed_sites dstdomain .example.com .google.com", "globe", "green", false),
    info("srcdomain", "Domains", "Client domain (needs reverse DNS, slow).", "acl internal srcdomain .corp.local", "globe", "green", true),
    info("dstdom_regex", "Domains", "Regular expression over the destination domain.", "acl social dstdom_regex -i (facebook|twitter|instagram)\\.com", "globe", "green", false),
    info("srcdom_regex", "Domains", "Regular expression over the client domain (needs reverse DNS).", "acl outsiders srcdom_regex -i ^.*\\.external\\.com$", "globe", "green", true),
    // Ports
    info("port", "Ports", "Destination TCP port, single number or range.", "acl Safe_ports port 80 443 8080 21", "plug", "cyan", false),
    info("localport", "Ports", "Local port the connection arrived on.", "acl main_port localport 3128", "plug", "cyan", false),
    info("myportname", "Ports", "Port name as given in http_port.", "acl transparent myportname intercept_port", "plug", "cyan", false),
    // Time
    info("time", "Time", "Weekday and time of day. Format: [SMTWHFA][h1:m1-h2:m2]", "acl office_hours time MTWHF 09:00-18:00", "clock", "orange", false),
    // URL
    info("url_regex", "URL", "Regular expression over the full URL.", "acl ads url_regex -i \\.gif$ \\.jpg$ banner", "link", "indigo", false),
    info("urlpath_regex", "URL", "Regular expression over the URL path only.", "acl downloads urlpath_regex -i \\.exe$ \\.zip$ \\.rar$", "link", "indigo", false),
    info("urllogin", "URL", "Regular expression over the login part of the URL.", "acl guests urllogin -i ^guest.*", "link", "indigo", false),
    // Protocol
    info("proto", "Protocol", "Request protocol (HTTP, FTP...).", "acl http_proto proto HTTP", "exchange-alt", "teal", false),
    info("method", "Protocol", "HTTP request method.", "acl CONNECT method CONNECT", "exchange-alt", "teal", false),
    info("http_status", "Protocol", "HTTP status code of the reply.", "acl server_errors http_status 500 502 503 504", "exchange-alt", "teal", false),
    // Authentication
    info("proxy_auth", "Authentication", "Authenticated user name (needs proxy authentication).", "acl premium proxy_auth alice bob", "user-lock", "red", true),
    info("proxy_auth_regex", "Authentication", "Regular expression over the authenticated user name.", "acl admins proxy_auth_regex -i ^admin", "user-lock", "red", true),
    info("ext_user", "Authentication", "User name returned by an external helper.", "acl ldap_users ext_user alice bob", "user-lock", "red", true),
    info("ext_user_regex", "Authentication", "Regular expression over external helper user names.", "acl sales ext_user_regex -i ^sales_", "user-lock", "red", true),
    // Content
    info("browser", "Content", "Regular expression over the User-Agent header.", "acl bots browser -i (bot|crawler|spider)", "file-alt", "yellow", false),
    info("referer_regex", "Content", "Regular expression over the Referer header.", "acl from_google referer_regex -i google\\.com", "file-alt", "yellow", false),
    info("req_mime_type", "Content", "MIME type of the request body.", "acl image_upload req_mime_type image/jpeg image/png", "file-alt", "yellow", false),
    info("rep_mime_type", "Content", "MIME type of the reply.", "acl video rep_mime_type video/mp4 video/mpeg", "file-alt", "yellow", false),
    info("req_header", "Content", "A specific request header.", "acl api_key req_header X-API-Key", "file-alt", "yellow", false),
    info("rep_header", "Content", "A specific reply header.", "acl cacheable rep_header Cache-Control", "file-alt", "yellow", false),
    // SSL/TLS
    info("ssl_error", "SSL/TLS", "SSL/TLS error code.", "acl ssl_expired ssl_error X509_V_ERR_CERT_HAS_EXPIRED", "lock", "emerald", false),
    info("server_cert_fingerprint", "SSL/TLS", "Fingerprint of the server certificate.", "acl trusted_cert server_cert_fingerprint AA:BB:CC:DD", "lock", "emerald", false),
    info("ssl::server_name", "SSL/TLS", "Server Name Indication (SNI) of TLS connections.", "acl secure_site ssl::server_name .example.com", "lock", "emerald", false),
    info("ssl::server_name_regex", "SSL/TLS", "Regular expression over the SNI.", "acl banks ssl::server_name_regex -i bank.*\\.com$", "lock", "emerald", false),
    // Connections
    info("maxconn", "Connections", "Maximum concurrent connections per client IP.", "acl max_10 maxconn 10", "server", "pink", false),
    info("max_user_ip", "Connections", "Maximum distinct IPs per authenticated user.", "acl max_3_ips max_user_ip 3", "server", "pink", false),
    // Advanced
    info("external", "Advanced", "Custom external helper (can be very slow).", "acl verified external checker_script %DST", "cogs", "gray", true),
    info("random", "Advanced", "Random probability between 0.0 and 1.0.", "acl one_third random 0.333", "cogs", "gray", false),
    info("note", "Advanced", "Transaction annotation.", "acl has_note note important", "cogs", "gray", false),
    info("any-of", "Advanced", "Matches when any of the listed ACLs matches (OR).", "acl group any-of acl1 acl2 acl3", "cogs", "gray", false),
    info("all-of", "Advanced", "Matches when all of the listed ACLs match (AND).", "acl combined all-of acl1 acl2", "cogs", "gray", false),
];

pub fn acl_type_info(tag: &str) -> Option<&'static AclTypeInfo> {
    ACL_TYPES.iter().find(|t| t.tag == tag)
}

/// Types bucketed by group, in table order.
pub fn acl_type_groups() -> Vec<(&'static str, Vec<&'static AclTypeInfo>)> {
    let mut groups: Vec<(&'static str, Vec<&'static AclTypeInfo>)> = Vec::new();
    for t in ACL_TYPES {
        match groups.last_mut() {
            Some((name, members)) if *name == t.group => {
                members.push(t);
                continue;
            }
            _ => {}
        }
        groups.push((t.group, vec![t]));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tags_are_unique() {
        let tags: HashSet<_> = ACL_TYPES.iter().map(|t| t.tag).collect();
        assert_eq!(tags.len(), ACL_TYPES.len());
        assert!(ACL_TYPES.len() >= 40);
    }

    #[test]
    fn test_lookup() {
        let dst = acl_type_info("dst").unwrap();
        assert!(dst.slow);
        assert_eq!(dst.speed_icon(), "fas fa-hourglass text-orange-600");

        let src = acl_type_info("src").unwrap();
        assert!(!src.slow);
        assert_eq!(src.speed_icon(), "fas fa-bolt text-green-600");

        assert!(acl_type_info("ssl::server_name").is_some());
        assert!(acl_type_info("bogus").is_none());
    }

    #[test]
    fn test_groups_keep_table_order() {
        let groups = acl_type_groups();
        assert_eq!(groups[0].0, "Network / IP");
        assert_eq!(groups.last().unwrap().0, "Advanced");
        let total: usize = groups.iter().map(|(_, m)| m.len()).sum();
        assert_eq!(total, ACL_TYPES.len());
    }
}
