// One-time publication of the wallet to the page's wallet registry

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::{BridgeClient, ChannelTransport};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::standard::wallet::StandardWallet;

/// Where wallets are announced so pages can discover them.
pub trait WalletRegistry: Send + Sync {
    fn register_wallet(&self, wallet: Arc<StandardWallet>) -> Result<()>;
}

static INSTALLED: OnceCell<Arc<StandardWallet>> = OnceCell::new();

/// Wrap `provider` in the adapter and register it. Only the first successful
/// call per process registers; later calls fail with `AlreadyRegistered`.
/// A registry failure leaves nothing installed, so the call can be retried.
pub fn initialize(
    provider: Arc<BridgeClient>,
    registry: &dyn WalletRegistry,
) -> Result<Arc<StandardWallet>> {
    let mut created = false;
    let wallet = INSTALLED.get_or_try_init(|| {
        let wallet = StandardWallet::new(provider);
        if let Err(e) = registry.register_wallet(Arc::clone(&wallet)) {
            log::error!("❌ Wallet standard: registration failed: {}", e);
            return Err(e);
        }
        created = true;
        Ok::<_, BridgeError>(wallet)
    })?;
    if !created {
        log::warn!("⚠️ Wallet standard: wallet already registered, ignoring");
        return Err(BridgeError::AlreadyRegistered);
    }

    log::info!("✅ Wallet standard: registered {}", wallet.name());
    Ok(Arc::clone(wallet))
}

/// The registered wallet, if `initialize` has run.
pub fn installed() -> Option<Arc<StandardWallet>> {
    INSTALLED.get().cloned()
}

/// Handles returned by [`install`]
pub struct Installation {
    pub wallet: Arc<StandardWallet>,
    /// Serialized requests for the host
    pub outbound: mpsc::UnboundedReceiver<String>,
    /// Feed raw host messages here
    pub inbound: mpsc::UnboundedSender<String>,
    pub listener: JoinHandle<()>,
}

/// Build a channel-backed client, start its listener, and register the
/// wallet. Must run inside a tokio runtime.
pub fn install(config: BridgeConfig, registry: &dyn WalletRegistry) -> Result<Installation> {
    let (transport, outbound) = ChannelTransport::new();
    let client = Arc::new(BridgeClient::new(Arc::new(transport), config));
    let (inbound, inbound_rx) = mpsc::unbounded_channel();
    let listener = client.listen(inbound_rx)?;
    let wallet = match initialize(client, registry) {
        Ok(wallet) => wallet,
        Err(e) => {
            listener.abort();
            return Err(e);
        }
    };
    Ok(Installation {
        wallet,
        outbound,
        inbound,
        listener,
    })
}
