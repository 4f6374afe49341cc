const TELEGRAM_TEXT_HARD_LIMIT: usize = 4096;
const TELEGRAM_TEXT_SAFE_LIMIT: usize = 3900;
const TRUNCATE_NOTICE: &str = "\n\n⚠️ (Output was truncated...)";

/// Bold title plus an escaped `<pre>` body that fits one Telegram message.
pub(crate) fn as_html_block(title: &str, body: &str) -> String {
    let escaped_title = html_escape::encode_text(title);
    let budget = TELEGRAM_TEXT_SAFE_LIMIT
        .saturating_sub(TRUNCATE_NOTICE.len())
        .saturating_sub(escaped_title.len());

    let (mut escaped_body, truncated) = escape_within(body, budget);
    if truncated {
        escaped_body.push_str(TRUNCATE_NOTICE);
    }

    let message = format!("<b>{}</b>\n<pre>{}</pre>", escaped_title, escaped_body);
    if message.len() > TELEGRAM_TEXT_HARD_LIMIT {
        log::warn!("formatted Telegram message is close to hard limit len={}", message.len());
    }
    message
}

/// Escapes `input` char by char until the escaped text would exceed
/// `max_escaped_len`. Never splits an entity or a multi-byte char.
fn escape_within(input: &str, max_escaped_len: usize) -> (String, bool) {
    let mut escaped = String::with_capacity(input.len().min(max_escaped_len));
    let mut buf = [0u8; 4];

    for ch in input.chars() {
        let piece = html_escape::encode_text(&*ch.encode_utf8(&mut buf));
        if escaped.len() + piece.len() > max_escaped_len {
            return (escaped, true);
        }
        escaped.push_str(&piece);
    }

    (escaped, false)
}

#[cfg(test)]
mod tests {
    use super::{TELEGRAM_TEXT_HARD_LIMIT, as_html_block, escape_within};

    #[test]
    fn escapes_without_splitting_entities() {
        let (escaped, truncated) = escape_within("a<b", 4);
        assert_eq!(escaped, "a");
        assert!(truncated);

        let (escaped, truncated) = escape_within("a<b", 6);
        assert_eq!(escaped, "a&lt;b");
        assert!(!truncated);
    }

    #[test]
    fn long_bodies_are_truncated_with_notice() {
        let body = "• core (a:80): 3 min\n".repeat(400);
        let html = as_html_block("Error minutes", &body);
        assert!(html.len() <= TELEGRAM_TEXT_HARD_LIMIT);
        assert!(html.contains("Output was truncated"));
        assert!(html.starts_with("<b>Error minutes</b>\n<pre>"));
    }
}
