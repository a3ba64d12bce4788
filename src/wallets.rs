use crate::client::WalletProvider;
use alloy_primitives::Address;
use alloy_provider::{
    Provider,
    ProviderBuilder,
};
use alloy_signer_local::PrivateKeySigner;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use rpassword::prompt_password;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
    },
};

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".ethereum").join("keystore"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read keystore directory")? {
        let entry = entry.wrap_err("Failed to read keystore entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid keystore filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

/// Prompt for the keystore passphrase and decrypt the signing key. The prompt
/// owns the tty for its duration, so callers must not be drawing the page.
pub async fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<PrivateKeySigner> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = tokio::task::spawn_blocking(move || prompt_password(prompt))
        .await
        .wrap_err("Password prompt was cancelled")?
        .wrap_err("Failed to read wallet password")?;

    let secret = decrypt_key(&descriptor.path, password.as_bytes())
        .map_err(|_| eyre!("Invalid password for wallet '{}'", descriptor.name))?;

    PrivateKeySigner::from_slice(secret.as_slice()).map_err(|_| {
        eyre!(
            "Wallet '{}' contained unsupported key material",
            descriptor.name
        )
    })
}

/// Shared handle to the unlocked signing key. An unlocked session is what
/// "already authorized" means for the non-interactive account query.
#[derive(Clone, Default)]
pub struct WalletSession {
    signer: Arc<Mutex<Option<PrivateKeySigner>>>,
}

impl WalletSession {
    pub fn authorize(&self, signer: PrivateKeySigner) {
        *self.signer.lock().expect("wallet session lock poisoned") = Some(signer);
    }

    pub fn signer(&self) -> Option<PrivateKeySigner> {
        self.signer
            .lock()
            .expect("wallet session lock poisoned")
            .clone()
    }

    pub fn address(&self) -> Option<Address> {
        self.signer
            .lock()
            .expect("wallet session lock poisoned")
            .as_ref()
            .map(|s| s.address())
    }
}

/// Keystore-backed wallet provider. Owns the account authorization flow and
/// knows which network its node is on.
pub struct KeystoreWallet {
    descriptor: WalletDescriptor,
    rpc_url: String,
    session: WalletSession,
}

impl KeystoreWallet {
    pub fn new(
        descriptor: WalletDescriptor,
        rpc_url: impl Into<String>,
        session: WalletSession,
    ) -> Self {
        Self {
            descriptor,
            rpc_url: rpc_url.into(),
            session,
        }
    }
}

impl WalletProvider for KeystoreWallet {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.session.address().into_iter().collect())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if let Some(address) = self.session.address() {
            return Ok(vec![address]);
        }
        let signer = unlock_wallet(&self.descriptor).await?;
        let address = signer.address();
        self.session.authorize(signer);
        Ok(vec![address])
    }

    async fn chain_id(&self) -> Result<String> {
        let provider = ProviderBuilder::new().connect_http(
            self.rpc_url
                .parse()
                .wrap_err("Invalid RPC URL for chain id query")?,
        );
        let id = provider
            .get_chain_id()
            .await
            .wrap_err("eth_chainId query failed")?;
        Ok(format!("0x{id:x}"))
    }
}
