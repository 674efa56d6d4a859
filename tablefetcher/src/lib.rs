pub mod client;
pub mod error;
pub mod extract;

pub use crate::client::PostgrestClient;
pub use crate::extract::{extract_all, fetch_all};
