//! CLI command implementations.

mod ask;
mod config;
mod delete;
mod doctor;
mod ingest;
mod init;
mod list;
mod recall;
mod remember;
mod search;
mod summarize;

pub use ask::run_ask;
pub use config::run_config;
pub use delete::run_delete;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use init::run_init;
pub use list::run_list;
pub use recall::run_recall;
pub use remember::run_remember;
pub use search::run_search;
pub use summarize::run_summarize;
