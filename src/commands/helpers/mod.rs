mod auth;
mod control;
mod formatting;

pub(super) use auth::{is_authorized, log_unauthorized};
pub(super) use control::{acquire_command_slot, send_html_or_file, timeout_for};
pub(super) use formatting::as_html_block;
