//! HTTP handlers

pub mod storage_event;
