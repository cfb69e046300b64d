pub mod model;
pub mod pool;
pub mod reader;
pub mod writer;
