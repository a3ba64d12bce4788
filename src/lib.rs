pub mod client;

pub mod config;

pub mod contract;

pub mod test_helpers;

pub mod ui;

pub mod wallets;

pub mod nft_types {
    use alloy_sol_types::sol;

    sol! {
        #[sol(rpc)]
        contract Murmurations {
            event NewEpicNFTMinted(address sender, uint256 tokenId);

            function makeAnEpicNFT() public;
        }
    }
}
