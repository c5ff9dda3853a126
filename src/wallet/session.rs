//! WalletSession - connection to the injected provider
//!
//! Owns the `WalletState`, the connect state machine and the persisted
//! "last connected" intent. Observers follow state through `watch_state()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::address;
use super::network;
use super::provider::{ProviderEvent, Signer, WalletProvider};
use super::state::{ConnectionStatus, WalletState};
use crate::config::SessionConfig;
use crate::core::amount::{to_fixed, wei_to_ether};
use crate::core::keys::session as keys;
use crate::core::sync::lock;
use crate::error::{SessionError, SessionResult};
use crate::storage::DurableStorage;

/// Result of `connect()`
#[derive(Debug)]
pub enum ConnectOutcome {
    /// Connected; provider reactions run until `unsubscribe()`
    Connected(ProviderSubscription),
    /// Another connect attempt is in flight. Nothing was done.
    InFlight,
}

impl ConnectOutcome {
    pub fn subscription(self) -> Option<ProviderSubscription> {
        match self {
            ConnectOutcome::Connected(sub) => Some(sub),
            ConnectOutcome::InFlight => None,
        }
    }
}

/// Handle on the task reacting to provider account/chain notifications
#[derive(Debug)]
pub struct ProviderSubscription {
    abort: AbortHandle,
}

impl ProviderSubscription {
    pub fn unsubscribe(self) { self.abort.abort(); }
    pub fn is_active(&self) -> bool { !self.abort.is_finished() }
}

struct Inner {
    provider: Option<Arc<dyn WalletProvider>>,
    storage: Arc<dyn DurableStorage>,
    config: SessionConfig,
    state: watch::Sender<WalletState>,
    status: Mutex<ConnectionStatus>,
    error: Mutex<Option<SessionError>>,
    loading: AtomicBool,
    listener: Mutex<Option<AbortHandle>>,
}

#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<Inner>,
}

/// Holds `Connecting` for one attempt. Dropping it unfinished (cancelled
/// future) restores the previous status so the guard never sticks.
struct ConnectGuard<'a> {
    status: &'a Mutex<ConnectionStatus>,
    previous: ConnectionStatus,
    finished: bool,
}

impl ConnectGuard<'_> {
    fn finish(mut self, status: ConnectionStatus) {
        *lock(self.status) = status;
        self.finished = true;
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.status) = self.previous;
        }
    }
}

struct Busy<'a>(&'a AtomicBool);

impl<'a> Busy<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::SeqCst); }
}

impl WalletSession {
    /// `provider` is `None` when the host has no wallet capability
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        storage: Arc<dyn DurableStorage>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(WalletState::empty());
        Self {
            inner: Arc::new(Inner {
                provider,
                storage,
                config,
                state,
                status: Mutex::new(ConnectionStatus::Idle),
                error: Mutex::new(None),
                loading: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> WalletState { self.inner.state.borrow().clone() }
    pub fn watch_state(&self) -> watch::Receiver<WalletState> { self.inner.state.subscribe() }
    pub fn address(&self) -> Option<String> { self.inner.state.borrow().address().map(str::to_string) }
    pub fn is_connected(&self) -> bool { self.inner.state.borrow().is_connected() }
    pub fn signer(&self) -> Option<Signer> { self.inner.state.borrow().signer().cloned() }
    pub fn status(&self) -> ConnectionStatus { *lock(&self.inner.status) }
    pub fn error(&self) -> Option<SessionError> { lock(&self.inner.error).clone() }
    pub fn is_loading(&self) -> bool { self.inner.loading.load(Ordering::SeqCst) }
    pub fn has_provider(&self) -> bool { self.inner.provider.is_some() }
    pub fn config(&self) -> &SessionConfig { &self.inner.config }
    pub fn storage(&self) -> &Arc<dyn DurableStorage> { &self.inner.storage }

    pub fn is_correct_network(&self) -> bool {
        self.inner.state.borrow().chain_id() == Some(self.inner.config.expected_chain_id)
    }

    // =========================================================================
    // Connect / auto-connect / disconnect
    // =========================================================================

    /// Connect to the provider. Returns `InFlight` without side effects when
    /// another attempt is running.
    pub async fn connect(&self) -> SessionResult<ConnectOutcome> {
        match self.connect_once().await? {
            Some(_) => Ok(ConnectOutcome::Connected(self.listen())),
            None => Ok(ConnectOutcome::InFlight),
        }
    }

    /// Restore a previous session if the provider still authorizes the saved
    /// account. `Ok(None)` when there was nothing to restore.
    pub async fn auto_connect(&self) -> SessionResult<Option<ConnectOutcome>> {
        let Some(provider) = self.inner.provider.clone() else {
            return Err(self.record_error(SessionError::ProviderMissing));
        };
        let Some(saved) = self.saved_address() else {
            debug!("auto-connect: no previous session");
            return Ok(None);
        };
        match provider.accounts().await {
            Ok(accounts) if accounts.iter().any(|a| address::same(a, &saved)) => {
                debug!(address = %saved, "auto-connect: restoring session");
                self.connect().await.map(Some)
            }
            Ok(_) => {
                debug!(address = %saved, "auto-connect: account no longer authorized");
                self.clear_intent();
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "auto-connect: account lookup failed");
                self.clear_intent();
                Ok(None)
            }
        }
    }

    /// Local reset. The provider is not contacted.
    pub fn disconnect(&self) {
        self.inner.state.send_replace(WalletState::empty());
        {
            let mut status = lock(&self.inner.status);
            if *status != ConnectionStatus::Connecting {
                *status = ConnectionStatus::Idle;
            }
        }
        *lock(&self.inner.error) = None;
        self.clear_intent();
        info!("wallet disconnected");
    }

    /// Stop reacting to provider notifications
    pub fn teardown(&self) {
        if let Some(listener) = lock(&self.inner.listener).take() {
            listener.abort();
        }
    }

    fn begin_connect(&self) -> Option<ConnectGuard<'_>> {
        let mut status = lock(&self.inner.status);
        if *status == ConnectionStatus::Connecting {
            return None;
        }
        let previous = *status;
        *status = ConnectionStatus::Connecting;
        Some(ConnectGuard { status: &self.inner.status, previous, finished: false })
    }

    /// One guarded attempt. `Ok(None)` when another attempt holds the guard.
    async fn connect_once(&self) -> SessionResult<Option<String>> {
        let Some(guard) = self.begin_connect() else {
            debug!("connect already in flight");
            return Ok(None);
        };
        let _busy = Busy::start(&self.inner.loading);

        let result = match self.inner.provider.clone() {
            Some(provider) => self.establish(provider).await,
            None => Err(SessionError::ProviderMissing),
        };

        match result {
            Ok(state) => {
                let address = state.address().map(str::to_string).unwrap_or_default();
                self.inner.state.send_replace(state);
                guard.finish(ConnectionStatus::Connected);
                *lock(&self.inner.error) = None;
                self.persist_intent(&address);
                info!(address = %address, "wallet connected");
                Ok(Some(address))
            }
            Err(e) => {
                guard.finish(ConnectionStatus::Error);
                Err(self.record_error(e))
            }
        }
    }

    async fn establish(&self, provider: Arc<dyn WalletProvider>) -> SessionResult<WalletState> {
        let accounts = provider.request_accounts().await?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::Provider("wallet returned no accounts".into()))?;
        if !address::is_valid(&address) {
            return Err(SessionError::Provider(format!("invalid account address: {}", address)));
        }
        let chain_id = provider.chain_id().await?;
        let balance = self.format_balance(provider.balance(&address).await?)?;
        let signer = Signer::new(address.clone(), provider.clone());
        Ok(WalletState::new_connected(address, balance, chain_id, provider, signer))
    }

    fn format_balance(&self, wei: u128) -> SessionResult<String> {
        wei_to_ether(wei)
            .map(|eth| to_fixed(eth, self.inner.config.balance_decimals))
            .ok_or_else(|| SessionError::Provider(format!("balance out of range: {} wei", wei)))
    }

    // =========================================================================
    // Network switching
    // =========================================================================

    /// Switch the provider to `target_chain_id`, registering it from the
    /// static registry when the provider does not know it.
    pub async fn switch_network(&self, target_chain_id: u64) -> SessionResult<()> {
        let Some(provider) = self.state().provider().cloned() else {
            return Err(self.record_error(SessionError::NotConnected));
        };
        let _busy = Busy::start(&self.inner.loading);
        *lock(&self.inner.error) = None;

        if let Err(e) = self.try_switch(provider.as_ref(), target_chain_id).await {
            return Err(self.record_error(e));
        }
        match provider.chain_id().await {
            Ok(chain_id) => self.update_connected(|state| state.set_chain_id(chain_id)),
            Err(e) => warn!(error = %e, "chain id re-read after switch failed"),
        }
        info!(chain_id = target_chain_id, "network switched");
        Ok(())
    }

    async fn try_switch(&self, provider: &dyn WalletProvider, chain_id: u64) -> SessionResult<()> {
        let hex = network::chain_id_hex(chain_id);
        match provider.switch_chain(&hex).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                let config = network::lookup(chain_id).ok_or(SessionError::UnsupportedNetwork(chain_id))?;
                debug!(chain = config.name, "chain unknown to provider, adding it");
                provider
                    .add_chain(&config.add_chain_params())
                    .await
                    .map_err(|e| SessionError::AddNetworkFailed(e.message))?;
                provider.switch_chain(&hex).await.map_err(|e| SessionError::SwitchFailed(e.message))
            }
            Err(e) => Err(SessionError::SwitchFailed(e.message)),
        }
    }

    // =========================================================================
    // Provider reactions
    // =========================================================================

    /// Spawn the reaction task; a newer subscription replaces the older one
    fn listen(&self) -> ProviderSubscription {
        let rx = match &self.inner.provider {
            Some(provider) => provider.subscribe(),
            None => broadcast::channel(1).1,
        };
        let weak = Arc::downgrade(&self.inner);
        let abort = tokio::spawn(react(weak, rx)).abort_handle();
        if let Some(previous) = lock(&self.inner.listener).replace(abort.clone()) {
            previous.abort();
        }
        ProviderSubscription { abort }
    }

    async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    info!("wallet accounts removed");
                    self.disconnect();
                }
                Some(account) if !self.is_current(account) => {
                    info!(account = %account, "wallet account changed, reconnecting");
                    if let Err(e) = self.connect_once().await {
                        warn!(error = %e, "reconnect after account change failed");
                    }
                }
                Some(_) => {}
            },
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id).await,
        }
    }

    async fn on_chain_changed(&self, chain_id: u64) {
        let Some(address) = self.address() else { return };
        debug!(chain_id, "provider chain changed");
        self.update_connected(|state| state.set_chain_id(chain_id));

        let Some(provider) = self.inner.provider.clone() else { return };
        match provider.balance(&address).await.map_err(SessionError::from).and_then(|wei| self.format_balance(wei)) {
            Ok(balance) => self.update_connected(|state| {
                if state.address().map(|a| address::same(a, &address)).unwrap_or(false) {
                    state.set_balance(balance);
                }
            }),
            Err(e) => warn!(error = %e, "balance refresh after chain change failed"),
        }
    }

    fn is_current(&self, account: &str) -> bool {
        self.inner.state.borrow().address().map(|a| address::same(a, account)).unwrap_or(false)
    }

    /// Mutate the state only while connected
    fn update_connected(&self, f: impl FnOnce(&mut WalletState)) {
        self.inner.state.send_if_modified(|state| {
            if !state.is_connected() { return false; }
            let before = state.clone();
            f(state);
            *state != before
        });
    }

    // =========================================================================
    // Errors + durable intent
    // =========================================================================

    fn record_error(&self, e: SessionError) -> SessionError {
        warn!(error = %e, "wallet error");
        *lock(&self.inner.error) = Some(e.clone());
        e
    }

    fn saved_address(&self) -> Option<String> {
        let read = |key: &str| match self.inner.storage.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "reading session intent failed");
                None
            }
        };
        let connected = read(keys::CONNECTED).as_deref() == Some(keys::CONNECTED_TRUE);
        let saved = read(keys::ADDRESS).filter(|a| !a.trim().is_empty());
        match (connected, saved) {
            (true, Some(address)) => Some(address),
            (false, None) => None,
            _ => {
                // Half-written record
                self.clear_intent();
                None
            }
        }
    }

    fn persist_intent(&self, address: &str) {
        let storage = &self.inner.storage;
        let result = storage
            .set_item(keys::CONNECTED, keys::CONNECTED_TRUE)
            .and_then(|_| storage.set_item(keys::ADDRESS, address));
        if let Err(e) = result {
            warn!(error = %e, "persisting session intent failed");
        }
    }

    fn clear_intent(&self) {
        for &key in keys::ALL {
            if let Err(e) = self.inner.storage.remove_item(key) {
                warn!(key, error = %e, "clearing session intent failed");
            }
        }
    }
}

async fn react(session: Weak<Inner>, mut rx: broadcast::Receiver<ProviderEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "provider events lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let Some(inner) = session.upgrade() else { break };
        WalletSession { inner }.handle_event(event).await;
    }
    debug!("provider subscription ended");
}
