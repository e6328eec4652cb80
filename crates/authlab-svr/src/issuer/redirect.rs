use authlab_core::Config;
use url::{Host, Url};

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

/// Registrable part of a domain, approximated by its last two labels.
fn base_domain(domain: &str) -> &str {
    match domain.rmatch_indices('.').nth(1) {
        Some((index, _)) => &domain[index + 1..],
        None => domain,
    }
}

fn within(domain: &str, base: &str) -> bool {
    domain.eq_ignore_ascii_case(base)
        || domain
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", base.to_ascii_lowercase()))
}

/// Whether a client may receive codes at `redirect_uri`: loopback hosts, the
/// issuer's own domain and its subdomains, and the configured extra hosts.
pub fn redirect_allowed(config: &Config, redirect_uri: &Url) -> bool {
    if !matches!(redirect_uri.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = redirect_uri.host() else {
        return false;
    };
    if is_loopback(&host) {
        return true;
    }
    let Host::Domain(domain) = host else {
        return false;
    };
    if config
        .issuer
        .allowed_redirect_hosts
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    {
        return true;
    }
    match config.server.hostname.host() {
        Some(Host::Domain(own)) => within(domain, base_domain(own)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hostname: &str, allowed: &[&str]) -> Config {
        serde_json::from_value(serde_json::json!({
            "server": { "hostname": hostname },
            "entry": { "client_id": "demo" },
            "issuer": { "signing_secret": "s", "allowed_redirect_hosts": allowed },
            "providers": { "password": { "type": "password" } },
        }))
        .unwrap()
    }

    fn allowed(config: &Config, uri: &str) -> bool {
        redirect_allowed(config, &Url::parse(uri).unwrap())
    }

    #[test]
    fn own_domain_and_subdomains_are_allowed() {
        let config = config("https://auth.example.com", &[]);
        assert!(allowed(&config, "https://app.example.com/cb"));
        assert!(allowed(&config, "https://example.com/cb"));
        assert!(allowed(&config, "https://a.b.example.com/cb"));
        assert!(!allowed(&config, "https://example.com.attacker.net/cb"));
        assert!(!allowed(&config, "https://notexample.com/cb"));
    }

    #[test]
    fn loopback_is_always_allowed() {
        let config = config("https://auth.example.com", &[]);
        assert!(allowed(&config, "http://localhost:3000/cb"));
        assert!(allowed(&config, "http://127.0.0.1:8080/cb"));
        assert!(allowed(&config, "http://[::1]/cb"));
    }

    #[test]
    fn foreign_hosts_need_listing() {
        let config = config("https://auth.example.com", &["partner.test"]);
        assert!(allowed(&config, "https://partner.test/cb"));
        assert!(!allowed(&config, "https://evil.attacker.net/steal"));
        assert!(!allowed(&config, "https://sub.partner.test/cb"));
    }

    #[test]
    fn non_web_schemes_are_rejected() {
        let config = config("https://auth.example.com", &[]);
        assert!(!allowed(&config, "javascript:alert(1)"));
        assert!(!allowed(&config, "ftp://app.example.com/cb"));
    }

    #[test]
    fn ip_hostname_only_allows_loopback_and_listed() {
        let config = config("http://10.0.0.5:9090", &[]);
        assert!(!allowed(&config, "http://10.0.0.5/cb"));
        assert!(allowed(&config, "http://localhost/cb"));
    }
}
