pub mod capi;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod filters;
pub mod responder;
pub mod schemas;
pub mod sender;
