//! Knowledge indexing and retrieval-augmented answers over a local folder of
//! study material: text, PDFs, audio, video and images.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use config::Config;
pub use error::{HelixTutorError, Result};
