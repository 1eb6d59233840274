pub mod error;
pub mod fetch;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod transform;
