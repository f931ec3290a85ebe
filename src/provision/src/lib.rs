pub mod config;
pub mod device_client;
pub mod http_client;
pub mod poller;
pub mod report;
pub mod workflow;
