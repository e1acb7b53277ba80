// Library for tests to access modules

pub mod charts;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod pmapi;
pub mod poller;
pub mod routes;
pub mod version;
