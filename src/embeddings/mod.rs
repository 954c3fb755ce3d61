pub mod client;

pub use client::Embedder;
