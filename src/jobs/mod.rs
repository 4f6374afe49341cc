use teloxide::prelude::*;

use crate::app_context::AppContext;

mod config_reload;
mod monitor;

pub fn start_background_jobs(bot: Bot, app_context: AppContext) {
    monitor::start_monitor_job(bot, app_context.clone());
    config_reload::start_config_hot_reload_job(app_context);
}
