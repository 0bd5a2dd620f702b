pub mod rpc;
pub mod submitter;
pub mod wallet;

pub use rpc::SolanaClient;
pub use submitter::SolanaSubmitter;
pub use wallet::{WalletError, WalletManager};
