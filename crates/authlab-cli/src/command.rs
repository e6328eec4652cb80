use clap::{arg, Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Subcommands {
    Run(SubcommandRun),
}

#[derive(Args, Debug, Clone)]
pub struct SubcommandRun {
    #[arg(short, long = "config", env = "AUTHLAB_CONFIG_FILE")]
    pub configfile: Option<PathBuf>,

    #[arg(short, long = "log-filter", env = "AUTHLAB_LOG_FILTER")]
    pub log_filter: Option<String>,

    #[arg(long = "prometheus", env = "AUTHLAB_PROMETHEUS")]
    pub prometheus: Option<bool>,

    #[arg(long = "health-check", env = "AUTHLAB_HEALTH_CHECK")]
    pub health_check: Option<bool>,

    /// Defaults to 0.0.0.0:9090 when neither the flag nor the config file sets it.
    #[arg(long = "addr", env = "AUTHLAB_SERVER_ADDR")]
    pub addr: Option<SocketAddr>,

    #[arg(long = "hostname", env = "AUTHLAB_SERVER_HOSTNAME")]
    pub hostname: Option<Url>,

    #[arg(long = "entry-client-id", env = "AUTHLAB_ENTRY_CLIENT_ID")]
    pub entry_client_id: Option<String>,

    #[arg(long = "entry-redirect-uri", env = "AUTHLAB_ENTRY_REDIRECT_URI")]
    pub entry_redirect_uri: Option<Url>,

    #[arg(long = "entry-scopes", env = "AUTHLAB_ENTRY_SCOPES", value_delimiter = ',', num_args = 1..)]
    pub entry_scopes: Option<Vec<String>>,

    #[arg(long = "signing-secret", env = "AUTHLAB_SIGNING_SECRET")]
    pub signing_secret: Option<String>,

    #[arg(long = "database-url", env = "AUTHLAB_DATABASE_URL")]
    pub database_url: Option<String>,

    /// `memory` or `sqlite`
    #[arg(long = "storage", env = "AUTHLAB_STORAGE")]
    pub storage: Option<String>,

    /// Registers a `password` provider.
    #[arg(long = "password", env = "AUTHLAB_PASSWORD", default_value_t = false)]
    pub password: bool,

    /// Provider name of the OIDC upstream.
    #[arg(long = "oidc-name", env = "AUTHLAB_OIDC_NAME", default_value_t = String::from("oauth2"))]
    pub oidc_name: String,

    #[arg(long = "oidc-issuer", env = "AUTHLAB_OIDC_ISSUER")]
    pub oidc_issuer: Option<String>,

    #[arg(long = "oidc-client-id", env = "AUTHLAB_OIDC_CLIENT_ID")]
    pub oidc_client_id: Option<String>,

    #[arg(long = "oidc-client-secret", env = "AUTHLAB_OIDC_CLIENT_SECRET")]
    pub oidc_client_secret: Option<String>,

    #[arg(long = "oidc-scopes", env = "AUTHLAB_OIDC_SCOPES", value_delimiter = ',', num_args = 1..)]
    pub oidc_scopes: Option<Vec<String>>,
}
