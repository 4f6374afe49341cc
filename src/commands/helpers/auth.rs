use teloxide::prelude::*;

use crate::config::Config;

/// Commands are accepted only from the owner, in the owner's private chat.
pub(crate) fn is_authorized(msg: &Message, config: &Config) -> bool {
    let Some(from) = msg.from.as_ref() else {
        return false;
    };

    let (Ok(owner_user_id), Ok(owner_chat_id)) = (config.owner_user_id(), config.owner_chat_id())
    else {
        return false;
    };

    from.id == owner_user_id && msg.chat.id == owner_chat_id
}

pub(crate) fn log_unauthorized(msg: &Message, config: &Config) {
    let expected = config
        .owner_user_id()
        .map(|id| id.0.to_string())
        .unwrap_or_else(|_| "invalid_owner_id".to_string());
    let user_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    log::warn!(
        "SECURITY: unauthorized command ignored. expected_user_id={} user_id={} chat_id={} command_text={:?}",
        expected,
        user_id,
        msg.chat.id.0,
        msg.text()
    );
}
