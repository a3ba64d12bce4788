use alloy_primitives::U256;

pub const APP_TITLE: &str = "murmurations";
pub const APP_SUBTITLE: &str = "Unique bicycles for unique souls. Discover your NFT below.";

pub const MOBIUS_HANDLE: &str = "m0bius.eth";
pub const MOBIUS_URL: &str = "https://twitter.com/cyclemobius";
pub const LINENOISE_HANDLE: &str = "linenoise.eth";
pub const LINENOISE_URL: &str = "https://linenoise.io/";

pub const CONTRACT_ADDRESS: &str = "0xA5768184E124a72Bc53cc2bB898e824F50DdA336";

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:8545/";

pub const ETHERSCAN_TX_URL: &str = "https://rinkeby.etherscan.io/tx/";
pub const OPENSEA_ASSET_URL: &str = "https://testnets.opensea.io/assets/";

pub const WALLET_REQUIRED_NOTICE: &str =
    "You will need an Ethereum wallet such as MetaMask to connect and mint NFTs.";

/// The one network/contract pair this page is willing to operate against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TargetChain {
    pub chain_id: &'static str,
    pub name: &'static str,
    pub contract_address: &'static str,
}

pub const TARGET_CHAIN: TargetChain = TargetChain {
    chain_id: "0x4",
    name: "Rinkeby",
    contract_address: CONTRACT_ADDRESS,
};

pub fn opensea_asset_url(contract_address: &str, token_id: U256) -> String {
    format!("{OPENSEA_ASSET_URL}{contract_address}/{token_id}")
}

pub fn etherscan_tx_url(tx_hash: &str) -> String {
    format!("{ETHERSCAN_TX_URL}{tx_hash}")
}
