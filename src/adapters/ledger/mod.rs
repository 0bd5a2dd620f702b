pub mod file_ledger;

pub use file_ledger::FileLedger;
