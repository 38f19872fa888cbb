//! Service layer: the client initialization path.

pub mod initializer;

pub use initializer::{ClientInitializer, ClientSession};
