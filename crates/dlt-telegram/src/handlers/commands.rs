use std::sync::Arc;

use teloxide::prelude::*;

use dlt_core::domain::ChatId;

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, _arg) = parse_command(text);

    match cmd.as_str() {
        "stats" => {
            let username = msg.from().and_then(|u| u.username.as_deref());
            let Some(report) = state.pipeline.admin_report(username).await else {
                return Ok(());
            };
            if let Err(e) = state
                .messenger
                .send_text(ChatId(msg.chat.id.0), &report, true)
                .await
            {
                tracing::error!(chat_id = msg.chat.id.0, error = %e, "failed to send stats report");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/Stats@dual_bot now"),
            ("stats".to_string(), "now".to_string())
        );
        assert_eq!(parse_command("/stats"), ("stats".to_string(), String::new()));
    }
}
