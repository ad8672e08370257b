pub mod collect;
pub mod config;
pub mod error;
pub mod fetch;
pub mod partial;
pub mod store;
pub mod transport;

#[macro_use]
extern crate log;

pub use config::FetchConfig;
pub use partial::{
    Outcome,
    PartialFetch,
    Stage,
    partial_fetch,
};
