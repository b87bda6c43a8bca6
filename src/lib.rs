pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod labels;
pub mod level;
pub mod logging;
pub mod matcher;
pub mod name_input;
pub mod replay;
pub mod scheduler;
pub mod scores;
pub mod session;
pub mod target;
pub mod turret;
