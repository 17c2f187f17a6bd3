//! Test doubles for leadscout components.
//!
//! This module provides:
//! - A fetcher serving canned pages
//! - A chat client replaying scripted responses
//! - A recording crawl observer
//! - A search source returning fixed hits

mod mocks;

pub use mocks::{RecordingCrawlObserver, ScriptedChatClient, StaticFetcher, StaticSearchSource};
