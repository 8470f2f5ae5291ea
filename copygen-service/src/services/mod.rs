pub mod generation;
pub mod providers;

pub use generation::generate_with_fallback;
