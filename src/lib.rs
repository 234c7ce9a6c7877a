//! Cineload - batch loading of movie catalogues into a vector index
//!
//! Reads a CSV catalogue of movies, renders each row as a text document with
//! filterable metadata, and upserts the documents into a Pinecone index with
//! integrated embedding, a fixed number of documents per request.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `source` - CSV reading and typed rows
//! - `document` - Row to document normalization
//! - `batch` - Fixed-size partitioning
//! - `vector_store` - Record writers (Pinecone, in-memory)
//! - `pipeline` - Sequential batch upload
//! - `mcp` - Tool server over stdio
//!
//! # Example
//!
//! ```rust,no_run
//! use cineload::config::Settings;
//! use cineload::pipeline::{prepare_documents, UploadConfig, Uploader};
//! use cineload::vector_store::PineconeClient;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let documents = prepare_documents(Path::new("movies.csv"), &settings)?;
//!
//!     let client = Arc::new(PineconeClient::from_settings(&settings)?);
//!     let uploader = Uploader::new(UploadConfig::from_settings(&settings)?, client);
//!     let report = uploader.upload(&documents).await?;
//!     println!("Uploaded {} records", report.upserted());
//!
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod mcp;
pub mod pipeline;
pub mod source;
pub mod vector_store;

pub use error::{CineloadError, Result};
