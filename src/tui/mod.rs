pub mod footer;
pub mod header;
pub mod render;
pub mod spinner;
pub mod table;
