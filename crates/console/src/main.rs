//! `tenantdesk` command-line shell.
//!
//! Resolves the session (persisted token or env credentials), navigates the
//! route guard to one location and prints what the console would render.

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use tenantdesk_console::{
    AuthSession, ConsoleConfig, Dashboard, FileTokenStore, GuardState, NavigationTree, RouteGuard,
    RouteTable,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::from_env();
    tenantdesk_observability::init(&config.log_filter);
    for rejected in &config.rejected {
        tracing::warn!(%rejected, "ignoring invalid configuration value");
    }

    let store = Arc::new(FileTokenStore::new(config.token_path()?));
    tracing::info!(api_url = %config.api_url, token_path = %store.path().display(), "starting tenantdesk");
    let auth = AuthSession::new(&config, store).context("failed to build identity client")?;
    let mut guard = RouteGuard::new(RouteTable::admin_console(), auth.subscribe(), &config);

    let location = std::env::var("TENANTDESK_PATH").unwrap_or_else(|_| config.home_path.clone());

    auth.start().await;
    guard.navigate(&location);

    if let GuardState::Unauthenticated { .. } = guard.state() {
        match (std::env::var("TENANTDESK_EMAIL"), std::env::var("TENANTDESK_PASSWORD")) {
            (Ok(email), Ok(password)) => {
                if auth.login(&email, &password).await {
                    let target = guard.post_login_target();
                    guard.navigate(&target);
                } else {
                    tracing::warn!("login failed; staying on the login page");
                }
            }
            _ => tracing::info!("no session and no TENANTDESK_EMAIL/TENANTDESK_PASSWORD; login required"),
        }
    }

    let dashboard = match guard.state() {
        GuardState::Authorized { path } if *path == config.home_path => {
            match Dashboard::load(&auth.admin()).await {
                Ok(dashboard) => Some(dashboard),
                Err(err) if err.is_session_expired() => None,
                Err(err) => {
                    tracing::error!(error = %err, "failed to load dashboard data");
                    None
                }
            }
        }
        _ => None,
    };

    // A 401 during the dashboard load signs out; reflect it before printing.
    if let Some(login_path) = auth.take_forced_redirect() {
        tracing::info!(%login_path, "session expired during this run");
        guard.reevaluate();
    }

    let session = auth.current();
    let navigation = NavigationTree::admin_console().visible_entries(session.as_deref());

    let user = session.as_ref().map(|s| {
        json!({
            "userId": s.user_id(),
            "tenantId": s.tenant_id(),
            "name": s.profile().display_name(),
            "initials": s.profile().initials(),
            "email": s.profile().email,
            "tenant": s.profile().tenant_name,
            "roles": s.roles().iter().map(|r| r.code.as_str()).collect::<Vec<_>>(),
            "permissions": s.permissions(),
        })
    });

    let output = json!({
        "guard": guard.state(),
        "user": user,
        "navigation": navigation,
        "dashboard": dashboard,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
