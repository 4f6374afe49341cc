use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum PingCommands {
    #[command(description = "Show help menu.")]
    Help,
    #[command(description = "Show bot health and monitor liveness.")]
    Health,
    #[command(description = "Show the current outage session and alert cooldown.")]
    Session,
    #[command(description = "Guarded error minutes for 1h, 2h, 3h, 6h, today, yesterday, two days ago, 1 and 2 weeks.")]
    Errors,
    #[command(description = "Error minutes since local midnight of now minus an interval, e.g. /errorsince 3d 4h")]
    Errorsince(String),
    #[command(description = "Error minutes in an absolute range, e.g. /errorrange 2025-09-01T00:00:00+07:00 2025-09-02T00:00:00+07:00")]
    Errorrange(String),
}
