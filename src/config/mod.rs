//! Configuration module for cineload.
//!
//! Handles loading, validating and saving application settings.

mod settings;

pub use settings::{
    GeneralSettings, IndexSettings, IngestSettings, Settings, API_KEY_ENV,
};
