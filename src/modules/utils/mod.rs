pub mod logging;
pub mod time;
