pub mod bundled;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fixture;
pub mod http_cache;
pub mod http_client;
pub mod listing;
pub mod normalize;
pub mod record;
pub mod results;
pub mod rounds;
pub mod store;
pub mod sync;
pub mod teams;
pub mod update;

pub use error::{Error, Result};
pub use record::{MatchId, MatchRecord, MatchStatus, RoundType, Tally};
