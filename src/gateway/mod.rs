pub mod client;
pub mod language;
pub mod wire;

pub use client::{NewsGateway, NewsQuery};
