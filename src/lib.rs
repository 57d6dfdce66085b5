pub mod cleaning;
pub mod compare;
pub mod config;
pub mod eda;
pub mod error;
pub mod forecast;
pub mod headers;
pub mod mail;
pub mod pipeline;
pub mod sales;
pub mod schema;
pub mod sheet;
pub mod storage;
pub mod warehouse;
