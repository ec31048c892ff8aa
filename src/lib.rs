//! A client for the Internet Archive's [Wayback Availability JSON
//! API](https://archive.org/help/wayback_api.php): finds the archived
//! snapshot of a URL closest to a given time.

pub use crate::{
    client::{Client, Snapshot},
    error::{Error, Result},
    timestamp::{Timestamp, TIME_LAYOUT},
};

pub mod client;
pub mod config;
pub mod error;
pub mod timestamp;
