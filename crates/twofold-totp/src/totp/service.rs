//! High-level orchestrator: owns the account list and its collaborators.
//!
//! The store, the clock and the current-site lookup are injected at
//! construction, so hosts and tests can swap them freely. Every mutation is
//! applied to a copy, saved, and only then committed; a failed save leaves
//! the in-memory list untouched.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::totp::core;
use crate::totp::export;
use crate::totp::import;
use crate::totp::qr;
use crate::totp::ranker;
use crate::totp::storage::AccountList;
use crate::totp::types::*;
use crate::totp::uri;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Collaborators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Persistent home of the account list.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Load the stored list. Missing or unreadable data yields an empty
    /// list; implementations log rather than fail.
    async fn load(&self) -> Vec<Account>;

    /// Replace the stored list. Failures are reported, never retried here.
    async fn save(&self, accounts: &[Account]) -> Result<(), TotpError>;
}

/// Source of the current unix time.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Source of the domain of the site the user is looking at ("" if unknown).
pub trait DomainProvider: Send + Sync {
    fn current_domain(&self) -> String;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        core::current_unix_time()
    }
}

/// Settable clock for tests and replay.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(unix: u64) -> Self {
        Self(AtomicU64::new(unix))
    }

    pub fn set(&self, unix: u64) {
        self.0.store(unix, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Domain provider that always answers the same domain.
#[derive(Debug, Clone, Default)]
pub struct StaticDomain(pub String);

impl StaticDomain {
    pub fn new(domain: impl Into<String>) -> Self {
        Self(domain.into())
    }
}

impl DomainProvider for StaticDomain {
    fn current_domain(&self) -> String {
        self.0.clone()
    }
}

/// In-memory store. Saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<Account> {
        self.accounts.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryStore {
    async fn load(&self) -> Vec<Account> {
        self.accounts.lock().await.clone()
    }

    async fn save(&self, accounts: &[Account]) -> Result<(), TotpError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(TotpError::new(
                TotpErrorKind::StorageError,
                "memory store is read-only",
            ));
        }
        *self.accounts.lock().await = accounts.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thread-safe service handle shared with the host.
pub type AuthenticatorState = Arc<Mutex<AuthenticatorService>>;

/// Central account service.
pub struct AuthenticatorService {
    accounts: AccountList,
    store: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
    domain: Arc<dyn DomainProvider>,
}

impl AuthenticatorService {
    /// Create an empty service. Call [`load`](Self::load) to read the store.
    pub fn new(
        store: Arc<dyn AccountStore>,
        clock: Arc<dyn Clock>,
        domain: Arc<dyn DomainProvider>,
    ) -> Self {
        Self {
            accounts: AccountList::new(),
            store,
            clock,
            domain,
        }
    }

    /// Wrap in `Arc<Mutex<_>>` for sharing.
    pub fn into_state(self) -> AuthenticatorState {
        Arc::new(Mutex::new(self))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Persistence
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Replace the in-memory list with the store's. Returns the count.
    pub async fn load(&mut self) -> usize {
        self.accounts = AccountList::from_accounts(self.store.load().await);
        log::info!("loaded {} accounts", self.accounts.len());
        self.accounts.len()
    }

    async fn commit(&mut self, next: AccountList) -> Result<(), TotpError> {
        if let Err(e) = self.store.save(next.accounts()).await {
            log::error!("account save failed: {}", e);
            return Err(e);
        }
        self.accounts = next;
        Ok(())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Account CRUD
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Accounts in insertion order.
    pub fn accounts(&self) -> &[Account] {
        self.accounts.accounts()
    }

    pub fn get_account(&self, id: &str) -> Result<Account, TotpError> {
        self.accounts.get(id).cloned().ok_or_else(|| {
            TotpError::new(TotpErrorKind::NotFound, format!("Account {} not found", id))
        })
    }

    /// Create an account from user input and persist.
    pub async fn add_account(
        &mut self,
        name: &str,
        issuer: &str,
        secret: &str,
    ) -> Result<Account, TotpError> {
        let mut next = self.accounts.clone();
        let account = next.add(name, issuer, secret)?;
        self.commit(next).await?;
        Ok(account)
    }

    /// Rename an account or change its issuer, and persist.
    pub async fn update_account(
        &mut self,
        id: &str,
        name: &str,
        issuer: &str,
    ) -> Result<Account, TotpError> {
        let mut next = self.accounts.clone();
        let account = next.update(id, name, issuer)?.clone();
        self.commit(next).await?;
        Ok(account)
    }

    /// Delete an account and persist. Irreversible.
    pub async fn delete_account(&mut self, id: &str) -> Result<Account, TotpError> {
        let mut next = self.accounts.clone();
        let removed = next.remove(id)?;
        self.commit(next).await?;
        Ok(removed)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Import / Export
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Import, merge and persist in one step.
    pub async fn import(
        &mut self,
        content: &str,
        format: ImportFormat,
    ) -> Result<ImportResult, TotpError> {
        let result = import::import_accounts(content, format, self.accounts.accounts())?;
        let mut next = self.accounts.clone();
        next.merge(result.added.clone());
        self.commit(next).await?;
        Ok(result)
    }

    /// Export all accounts. `Ok(None)` when there is nothing to export.
    pub fn export(&self, format: ExportFormat) -> Result<Option<String>, TotpError> {
        export::export_accounts(self.accounts.accounts(), format)
    }

    /// Download name for an export taken now.
    pub fn export_filename(&self, format: ExportFormat) -> String {
        let now = chrono::DateTime::from_timestamp(self.clock.now_unix() as i64, 0)
            .unwrap_or_default();
        export::suggested_filename(format, now)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Code generation
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Codes for every account at the injected clock's time.
    /// Idempotent; safe to call as often as the host likes.
    pub fn tick(&self) -> Result<Vec<GeneratedCode>, TotpError> {
        self.codes_at(self.clock.now_unix())
    }

    /// Codes for every account at `unix_seconds`.
    pub fn codes_at(&self, unix_seconds: u64) -> Result<Vec<GeneratedCode>, TotpError> {
        core::codes_for_accounts_at(self.accounts.accounts(), unix_seconds)
    }

    /// Code for a single account at the injected clock's time.
    pub fn code_for(&self, id: &str) -> Result<GeneratedCode, TotpError> {
        let account = self.get_account(id)?;
        core::code_for_account_at(&account, self.clock.now_unix())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Presentation helpers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Accounts filtered by `query` and ranked for the current site.
    pub fn visible_accounts(&self, query: &str) -> Vec<Account> {
        let domain = self.domain.current_domain();
        ranker::visible_accounts(self.accounts.accounts(), query, &domain)
    }

    /// Provisioning URI of an account.
    pub fn account_uri(&self, id: &str) -> Result<String, TotpError> {
        Ok(uri::build_otpauth_uri(&self.get_account(id)?))
    }

    /// Provisioning QR code of an account as a PNG data URI.
    pub fn account_qr_data_uri(&self, id: &str) -> Result<String, TotpError> {
        qr::account_to_qr_data_uri(&self.get_account(id)?)
    }
}
