pub mod client;
pub mod dispatch;
pub mod model;
pub mod parser;
