use anyhow::{Context, Result};
use authlab_core::Config;
use authlab_svr::router;
use figment::{
    providers::{Format, Json as FigmentJson},
    Figment,
};
use serde_json::json;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::utils::clean_json;

use super::command::SubcommandRun;

pub async fn run(cli: &SubcommandRun) -> Result<()> {
    let configfile = cli.configfile.clone().map(FigmentJson::file);
    let config: Config = Figment::new()
        .merge(configfile.unwrap_or(FigmentJson::string("{}")))
        .merge(figment_merge(cli)?)
        .extract()
        .context("Failed to load configuration")?;

    let env_filter = config
        .application
        .log_filter
        .as_deref()
        .unwrap_or("info")
        .parse::<EnvFilter>()
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(env_filter)
        .init();
    tracing::info!("{}", serde_json::to_string_pretty(&config)?);

    tracing::info!("Server started at: {}", config.server.addr);
    let cancel = CancellationToken::new();
    let listener = tokio::net::TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    let app = router::router(cancel.clone(), config)
        .await
        .context("Failed to build router")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down...");
    cancel.cancel();
}

fn figment_merge(
    cli: &SubcommandRun,
) -> Result<figment::providers::Serialized<figment::value::Value>> {
    let mut providers = serde_json::Map::new();
    if cli.password {
        providers.insert("password".to_string(), json!({ "type": "password" }));
    }
    providers.insert(
        cli.oidc_name.clone(),
        json!({
            "type": cli.oidc_issuer.as_ref().map(|_| "oidc"),
            "issuer": cli.oidc_issuer,
            "client": {
                "id": cli.oidc_client_id,
                "secret": cli.oidc_client_secret,
                "scopes": cli.oidc_scopes,
            }
        }),
    );

    let result = json!({
        "application": {
            "log_filter": cli.log_filter,
            "prometheus": cli.prometheus,
            "health_check": cli.health_check,
        },
        "server": {
            "addr": cli.addr,
            "hostname": cli.hostname,
        },
        "entry": {
            "client_id": cli.entry_client_id,
            "redirect_uri": cli.entry_redirect_uri,
            "scopes": cli.entry_scopes,
        },
        "issuer": {
            "signing_secret": cli.signing_secret,
        },
        "providers": providers,
        "storage": cli.storage.as_ref().map(|kind| json!({ "type": kind })),
        "database": {
            "url": cli.database_url,
        },
    });

    let figment_value: figment::value::Value = serde_json::from_value(clean_json(result))
        .context("Failed to convert command line options")?;
    Ok(figment::providers::Serialized::from(
        figment_value,
        figment::Profile::Default,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::command::{Cli, Subcommands};

    fn run_args(args: &[&str]) -> SubcommandRun {
        let cli = Cli::parse_from(["authlab", "run"].into_iter().chain(args.iter().copied()));
        match cli.subcommand {
            Subcommands::Run(run) => run,
        }
    }

    fn extract(args: &[&str]) -> Config {
        Figment::new()
            .merge(figment_merge(&run_args(args)).unwrap())
            .extract()
            .unwrap()
    }

    fn extract_with_file(file: &str, args: &[&str]) -> Config {
        Figment::new()
            .merge(FigmentJson::string(file))
            .merge(figment_merge(&run_args(args)).unwrap())
            .extract()
            .unwrap()
    }

    const CONFIG_FILE: &str = r#"{
        "server": { "addr": "127.0.0.1:8000", "hostname": "https://auth.example.com" },
        "entry": { "client_id": "demo" },
        "issuer": { "signing_secret": "secret" },
        "providers": { "password": { "type": "password" } }
    }"#;

    #[test]
    fn config_file_addr_survives_without_flag() {
        let config = extract_with_file(CONFIG_FILE, &[]);
        assert_eq!(config.server.addr, "127.0.0.1:8000".parse::<std::net::SocketAddr>().unwrap());
        assert_eq!(config.entry.client_id, "demo");
    }

    #[test]
    fn addr_flag_overrides_config_file() {
        let config = extract_with_file(CONFIG_FILE, &["--addr", "127.0.0.1:7000"]);
        assert_eq!(config.server.addr.port(), 7000);
    }

    #[test]
    fn flags_build_a_complete_config() {
        let config = extract(&[
            "--hostname",
            "https://auth.example.com",
            "--entry-client-id",
            "demo",
            "--signing-secret",
            "secret",
            "--password",
        ]);
        assert_eq!(config.entry.client_id, "demo");
        assert_eq!(config.server.addr.port(), 9090);
        assert_eq!(config.providers.len(), 1);
        assert!(config.providers.contains_key("password"));
        assert_eq!(config.entry.scope(), "openid profile email");
    }

    #[test]
    fn oidc_flags_register_named_provider() {
        let config = extract(&[
            "--hostname",
            "https://auth.example.com",
            "--entry-client-id",
            "demo",
            "--signing-secret",
            "secret",
            "--oidc-issuer",
            "https://idp.example.com",
            "--oidc-client-id",
            "client-1",
            "--oidc-scopes",
            "openid,email",
        ]);
        let Some(authlab_core::ProviderConfig::Oidc(oidc)) = config.providers.get("oauth2") else {
            panic!("expected oidc provider");
        };
        assert_eq!(oidc.client.id, "client-1");
        assert_eq!(oidc.client.scopes, vec!["openid", "email"]);
    }
}
