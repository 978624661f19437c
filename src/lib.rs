pub mod driver;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod minify;
pub mod options;
pub mod target;
pub mod writer;
