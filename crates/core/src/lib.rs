pub mod config;
pub mod date;
pub mod entity;
pub mod error;
pub mod kqi;
pub mod node;
pub mod normalize;

pub use config::Config;
pub use entity::*;
pub use error::*;
pub use kqi::Kqi;
pub use node::*;
pub use normalize::{KqiStatut, Tendance};
