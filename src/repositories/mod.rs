//! External stores other than PostgreSQL.

pub mod image_store;

pub use image_store::{ImageStore, LocalImageStore, S3ImageStore};
