pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod output;
pub mod picklist;
pub mod record;
pub mod report;
pub mod taxonomy;
