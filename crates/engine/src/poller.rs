// In crates/engine/src/poller.rs

use app_config::{AccountSettings, Settings};
use chrono::{DateTime, Utc};
use core_types::{Clock, ClosedTradesPayload, LiveDataPayload};
use ingest_client::{Endpoint, PushClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use terminal_client::{Credentials, Terminal};

use crate::reader::{read_account, read_open_positions};
use crate::reconciler::reconcile_closed_trades;

/// Timing and window settings for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub poll_interval: Duration,
    pub account_pause: Duration,
    pub lookback_hours: u32,
    pub connect_timeout: Duration,
}

impl PollOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.general.poll_interval(),
            account_pause: settings.general.account_pause(),
            lookback_hours: settings.general.lookback_hours_closed_trades,
            connect_timeout: settings.terminal.connect_timeout(),
        }
    }
}

/// What happened to one account during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    pub trading_account_id: i64,
    pub login: u64,
    pub session_opened: bool,
    /// `None` when no push was attempted.
    pub live_pushed: Option<bool>,
    pub closed_trades: usize,
    /// `None` when there was nothing to push.
    pub closed_pushed: Option<bool>,
    pub skipped_deals: usize,
    pub session_closed: bool,
}

impl AccountReport {
    fn new(account: &AccountSettings) -> Self {
        Self {
            trading_account_id: account.trading_account_id,
            login: account.login,
            session_opened: false,
            live_pushed: None,
            closed_trades: 0,
            closed_pushed: None,
            skipped_deals: 0,
            session_closed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub accounts: Vec<AccountReport>,
}

/// Polls every enabled account in turn and forwards its state.
///
/// One terminal, one session at a time: each account goes through
/// open → read → push live → reconcile → push closed → close before the next
/// one starts.
pub struct Poller<T: Terminal> {
    terminal: T,
    push_client: PushClient,
    clock: Arc<dyn Clock>,
    accounts: Vec<AccountSettings>,
    options: PollOptions,
    /// When set, the account list is re-read from this file before each cycle.
    accounts_file: Option<PathBuf>,
}

impl<T: Terminal> Poller<T> {
    /// Creates a poller for the given accounts. Disabled accounts are dropped here.
    pub fn new(
        terminal: T,
        push_client: PushClient,
        clock: Arc<dyn Clock>,
        accounts: Vec<AccountSettings>,
        options: PollOptions,
    ) -> Self {
        let accounts: Vec<AccountSettings> = accounts.into_iter().filter(|a| a.enabled).collect();
        Self {
            terminal,
            push_client,
            clock,
            accounts,
            options,
            accounts_file: None,
        }
    }

    /// Re-reads the `[[accounts]]` list from `path` at the start of every
    /// cycle, so accounts can be enabled or disabled without a restart.
    /// Other settings keep their startup values.
    pub fn with_accounts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounts_file = Some(path.into());
        self
    }

    pub fn enabled_accounts(&self) -> usize {
        self.accounts.len()
    }

    fn reload_accounts(&mut self) {
        let Some(path) = &self.accounts_file else {
            return;
        };

        match app_config::load_settings(path) {
            Ok(settings) => {
                let accounts: Vec<AccountSettings> = settings.enabled_accounts().cloned().collect();
                if accounts.len() != self.accounts.len() {
                    tracing::info!(
                        before = self.accounts.len(),
                        after = accounts.len(),
                        "Enabled account list changed."
                    );
                }
                self.accounts = accounts;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to reload accounts; keeping the previous list.");
            }
        }
    }

    /// Runs cycles until `should_stop` returns true. It is called with the
    /// number of completed cycles before each new one; the poll interval is
    /// slept only between cycles. Returns the number of cycles run.
    pub async fn run<F>(&mut self, mut should_stop: F) -> u64
    where
        F: FnMut(u64) -> bool,
    {
        tracing::info!(
            interval_secs = self.options.poll_interval.as_secs(),
            accounts = self.accounts.len(),
            "Starting poll loop."
        );

        let mut completed = 0u64;
        while !should_stop(completed) {
            if completed > 0 {
                tracing::debug!(interval_secs = self.options.poll_interval.as_secs(), "Cycle complete; sleeping.");
                self.clock.sleep(self.options.poll_interval).await;
            }
            self.run_cycle().await;
            completed += 1;
        }

        tracing::info!(cycles = completed, "Poll loop stopped.");
        completed
    }

    /// Processes every enabled account once, strictly in order.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.reload_accounts();

        if self.accounts.is_empty() {
            tracing::warn!("No enabled accounts to poll.");
            return CycleReport::default();
        }

        let accounts = self.accounts.clone();
        let mut report = CycleReport::default();

        for (index, account) in accounts.iter().enumerate() {
            if index > 0 {
                self.clock.sleep(self.options.account_pause).await;
            }
            report.accounts.push(self.process_account(account).await);
        }

        report
    }

    async fn process_account(&mut self, account: &AccountSettings) -> AccountReport {
        let mut report = AccountReport::new(account);
        let account_id = account.trading_account_id;
        let login = account.login;
        tracing::info!(account_id, login, name = ?account.name, "Processing account.");

        let credentials = Credentials {
            login,
            password: account.password.clone(),
            server: account.server.clone(),
        };

        if let Err(e) = self.terminal.open(&credentials, self.options.connect_timeout).await {
            tracing::error!(account_id, login, error = %e, "Failed to open terminal session; skipping account this cycle.");
            return report;
        }
        report.session_opened = true;
        tracing::info!(account_id, login, "Terminal session opened.");

        self.sync_account(account_id, &mut report).await;

        // The session is released whatever happened above.
        match self.terminal.close().await {
            Ok(()) => {
                report.session_closed = true;
                tracing::info!(account_id, login, "Terminal session closed.");
            }
            Err(e) => {
                tracing::error!(account_id, login, error = %e, "Failed to close terminal session.");
            }
        }

        report
    }

    async fn sync_account(&mut self, account_id: i64, report: &mut AccountReport) {
        // --- Live data ---
        let snapshot = read_account(&mut self.terminal).await;
        let open_positions = read_open_positions(&mut self.terminal).await;

        match snapshot {
            Some(snapshot) => {
                let payload = LiveDataPayload::new(snapshot, open_positions);
                let pushed = self.push(Endpoint::LiveData, account_id, &payload).await;
                report.live_pushed = Some(pushed);
            }
            None => {
                tracing::warn!(account_id, "No account info; live-data push skipped.");
            }
        }

        // --- Closed trades ---
        let now = self.clock.now();
        let from = lookback_start(now, self.options.lookback_hours);
        let reconciliation = reconcile_closed_trades(&mut self.terminal, from, now).await;
        report.closed_trades = reconciliation.trades.len();
        report.skipped_deals = reconciliation.skipped.len();

        if reconciliation.trades.is_empty() {
            tracing::info!(
                account_id,
                lookback_hours = self.options.lookback_hours,
                "No closed trades to push."
            );
            return;
        }

        let payload = ClosedTradesPayload {
            closed_trades: reconciliation.trades,
        };
        let pushed = self.push(Endpoint::ClosedTrades, account_id, &payload).await;
        report.closed_pushed = Some(pushed);
    }

    async fn push<P: serde::Serialize>(&self, endpoint: Endpoint, account_id: i64, payload: &P) -> bool {
        match self.push_client.push(endpoint, account_id, payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(account_id, endpoint = endpoint.as_str(), error = %e, "Push failed.");
                false
            }
        }
    }
}

fn lookback_start(now: DateTime<Utc>, lookback_hours: u32) -> DateTime<Utc> {
    now.checked_sub_signed(chrono::Duration::hours(i64::from(lookback_hours)))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
