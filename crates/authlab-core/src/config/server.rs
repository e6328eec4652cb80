use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
    /// Public base url of this issuer, every absolute endpoint is derived from it.
    pub hostname: Url,
}

fn default_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9090)
}

impl ServerConfig {
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.hostname.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub fn issuer(&self) -> String {
        self.endpoint("/").as_str().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(hostname: &str) -> ServerConfig {
        ServerConfig {
            addr: "127.0.0.1:9090".parse().unwrap(),
            hostname: Url::parse(hostname).unwrap(),
        }
    }

    #[test]
    fn endpoint_replaces_path_and_query() {
        let config = server("https://auth.example.com/some/path?x=1#frag");
        assert_eq!(
            config.endpoint("/authorize").as_str(),
            "https://auth.example.com/authorize"
        );
    }

    #[test]
    fn addr_defaults_to_all_interfaces() {
        let config: ServerConfig =
            serde_json::from_value(serde_json::json!({"hostname": "https://auth.example.com"}))
                .unwrap();
        assert_eq!(config.addr, "0.0.0.0:9090".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn issuer_has_no_trailing_slash() {
        assert_eq!(server("https://auth.example.com/").issuer(), "https://auth.example.com");
        assert_eq!(server("http://localhost:9090").issuer(), "http://localhost:9090");
    }
}
