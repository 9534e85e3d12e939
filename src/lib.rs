pub mod aggregate;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod features;
pub mod lid;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod scoring;
pub mod translation;
pub mod typology;
