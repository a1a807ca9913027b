//! Directory listings over a decoded tree: resolve one path on demand, or
//! precompute every directory up front with [`PathIndex`].

mod index;
mod resolve;


pub use index::PathIndex;
pub use resolve::resolve;
