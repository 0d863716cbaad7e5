pub mod cli;
pub mod history;
pub mod pipeline;
pub mod raw;
pub mod table;
pub mod toptier;
