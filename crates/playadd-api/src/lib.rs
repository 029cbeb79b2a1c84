pub mod spotify;
pub mod traits;
