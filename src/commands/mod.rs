mod command_def;
mod features;
mod handler;
mod helpers;
mod router;

pub use command_def::PingCommands;
pub use handler::answer;
