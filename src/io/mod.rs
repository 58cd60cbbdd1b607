//! Source and artifact I/O.

pub mod compression;
pub mod csv;
pub mod parquet;
