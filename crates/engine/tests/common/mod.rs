use app_config::AccountSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::ManualClock;
use ingest_client::{PushClient, PushConfig, RetryPolicy};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use terminal_client::{Credentials, Error, RawAccountInfo, RawDeal, RawPosition, Result, Terminal};

/// Wall-clock instant every test starts at: 2024-03-01T08:00:00Z.
pub const NOW: i64 = 1_709_280_000;

/// A terminal call, as seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(u64),
    AccountInfo,
    Positions,
    Deals { from: i64, to: i64 },
    Close,
}

/// What the fake terminal reports for one login.
#[derive(Debug, Clone, Default)]
pub struct AccountFixture {
    pub account: Option<RawAccountInfo>,
    pub positions: Vec<RawPosition>,
    pub deals: Vec<RawDeal>,
    pub reject_login: bool,
    pub fail_account_info: bool,
    pub fail_positions: bool,
}

/// In-memory terminal with a single session slot and a shared call log.
pub struct FakeTerminal {
    fixtures: HashMap<u64, AccountFixture>,
    session: Option<u64>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeTerminal {
    pub fn new(fixtures: Vec<(u64, AccountFixture)>) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let terminal = Self {
            fixtures: fixtures.into_iter().collect(),
            session: None,
            calls: calls.clone(),
        };
        (terminal, calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn current(&self) -> Result<&AccountFixture> {
        let login = self.session.ok_or(Error::NotConnected)?;
        self.fixtures.get(&login).ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Terminal for FakeTerminal {
    async fn open(&mut self, credentials: &Credentials, _timeout: Duration) -> Result<()> {
        self.record(Call::Open(credentials.login));
        if let Some(login) = self.session {
            return Err(Error::SessionBusy(login));
        }
        match self.fixtures.get(&credentials.login) {
            Some(fixture) if !fixture.reject_login => {
                self.session = Some(credentials.login);
                Ok(())
            }
            _ => Err(Error::Terminal { code: -6, msg: "Authorization failed".into() }),
        }
    }

    async fn account_info(&mut self) -> Result<Option<RawAccountInfo>> {
        self.record(Call::AccountInfo);
        let fixture = self.current()?;
        if fixture.fail_account_info {
            return Err(Error::Terminal { code: -1, msg: "account info unavailable".into() });
        }
        Ok(fixture.account.clone())
    }

    async fn positions(&mut self) -> Result<Vec<RawPosition>> {
        self.record(Call::Positions);
        let fixture = self.current()?;
        if fixture.fail_positions {
            return Err(Error::Terminal { code: -1, msg: "positions unavailable".into() });
        }
        Ok(fixture.positions.clone())
    }

    async fn deals(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<RawDeal>> {
        let (from, to) = (from.timestamp(), to.timestamp());
        self.record(Call::Deals { from, to });
        Ok(self
            .current()?
            .deals
            .iter()
            .filter(|d| d.time >= from && d.time < to)
            .cloned()
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        self.session = None;
        Ok(())
    }
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(DateTime::from_timestamp(NOW, 0).unwrap()))
}

pub fn push_client(base_url: &str, max_retries: u32, clock: Arc<ManualClock>) -> PushClient {
    PushClient::new(
        PushConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".into(),
            timeout: Duration::from_secs(2),
            verify_tls: true,
            retry: RetryPolicy { max_retries, delay: Duration::from_secs(5) },
        },
        clock,
    )
    .unwrap()
}

pub fn account(trading_account_id: i64, login: u64, enabled: bool) -> AccountSettings {
    AccountSettings {
        name: None,
        enabled,
        trading_account_id,
        login,
        password: "pw".into(),
        server: "Demo-Server".into(),
    }
}

pub fn account_info(login: u64, equity: Decimal, balance: Decimal) -> RawAccountInfo {
    RawAccountInfo { login, equity, balance, currency: Some("USD".into()) }
}

#[allow(dead_code)]
pub fn raw_deal(ticket: u64, order: u64, position_id: u64, entry: i32, kind: i32, price: Decimal, time: i64) -> RawDeal {
    RawDeal {
        ticket,
        order,
        position_id,
        entry,
        kind,
        volume: Decimal::ONE,
        price,
        time,
        symbol: "EURUSD".into(),
        swap: None,
        commission: None,
        profit: Decimal::new(50, 0),
    }
}
