pub mod animator;
pub mod client;
pub mod gateway;
pub mod poller;
pub mod positions;
pub mod profiles;
pub mod roll;
pub mod timer;
pub mod turn;
pub mod types;
pub mod ui;
pub mod wallets;

pub use types::{
    Address,
    PlayerInfo,
    Room,
};
