// In crates/engine/src/lib.rs

pub mod poller;
pub mod reader;
pub mod reconciler;

use anyhow::{Context, Result};
use app_config::Settings;
use core_types::Clock;
use ingest_client::{PushClient, PushConfig};
use std::sync::Arc;
use terminal_client::GatewayTerminal;

pub use poller::{AccountReport, CycleReport, PollOptions, Poller};
pub use reconciler::{reconcile, Reconciliation, SkippedDeal};

/// Wires a poller that talks to the terminal gateway and the ingestion API
/// described by `settings`.
pub fn build_gateway_poller(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Poller<GatewayTerminal>> {
    let terminal = GatewayTerminal::new(&settings.terminal).context("failed to create terminal gateway client")?;
    let push_client = PushClient::new(PushConfig::from(&settings.general), clock.clone())
        .context("failed to create ingestion client")?;

    Ok(Poller::new(
        terminal,
        push_client,
        clock,
        settings.accounts.clone(),
        PollOptions::from_settings(settings),
    ))
}
