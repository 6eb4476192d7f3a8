pub mod spotify;
pub mod sync;
pub mod token;
pub mod youtube;
