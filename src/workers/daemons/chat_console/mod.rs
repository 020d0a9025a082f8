use crate::common::context::Context;
use crate::common::datetime::{Locale, format_sent_at};
use crate::common::error::AppError;
use crate::common::init;
use crate::models::messages::{Message, MessageId};
use crate::settings::AppSettings;
use crate::usecases::sessions::ChatSession;
use anyhow::Context as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

const COUNTERPARTY_FALLBACK_NAME: &str = "Provider";

enum Command {
    Quit,
    Reload,
    Switch(i64),
    Send(String),
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/quit" => Command::Quit,
        "/reload" => Command::Reload,
        trimmed => match trimmed
            .strip_prefix("/switch ")
            .and_then(|id| id.trim().parse().ok())
        {
            Some(conversation_id) => Command::Switch(conversation_id),
            None => Command::Send(line.to_string()),
        },
    }
}

pub fn render_message(message: &Message, locale: Locale, display_name: &str) -> String {
    let author = match message.from_counterparty {
        true => message
            .author_name
            .as_deref()
            .unwrap_or(COUNTERPARTY_FALLBACK_NAME),
        false => display_name,
    };
    let sent_at = format_sent_at(&message.created_at, locale).unwrap_or_else(|e| {
        debug!(message_id = message.message_id, "{e}");
        locale.invalid_date_notice().to_string()
    });
    format!("{author}: {}\n    {sent_at}", message.content)
}

fn notify(error: AppError, locale: Locale) {
    if error.is_user_facing() {
        eprintln!("! {}", error.notice(locale));
    }
}

/// Prints messages as they land in the store, reprinting everything when the
/// list was replaced rather than extended.
async fn render_loop<C: Context + 'static>(
    session: Arc<ChatSession<C>>,
    locale: Locale,
    display_name: String,
) {
    let mut revision = session.watch();
    let mut printed: Vec<MessageId> = vec![];
    loop {
        let snapshot = session.snapshot();
        let extends_printed = snapshot.len() >= printed.len()
            && snapshot
                .iter()
                .zip(&printed)
                .all(|(message, id)| message.message_id == *id);
        let fresh = match extends_printed {
            true => &snapshot[printed.len()..],
            false => {
                println!("---- conversation {} ----", session.conversation_id());
                &snapshot[..]
            }
        };
        for message in fresh {
            println!("{}", render_message(message, locale, &display_name));
        }
        printed = snapshot.iter().map(|m| m.message_id).collect();

        if revision.changed().await.is_err() {
            break;
        }
    }
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let conversation_id = settings
        .conversation_id
        .context("CONVERSATION_ID must be set for the chat console")?;
    let state = init::initialize_state(settings).await?;
    let session = Arc::new(ChatSession::new(Arc::new(state), conversation_id));

    info!(
        session_id = %session.session_id(),
        conversation_id,
        "Opening chat console"
    );
    if let Err(e) = session.activate().await {
        notify(e, settings.display_locale);
    }

    let renderer = tokio::spawn(render_loop(
        session.clone(),
        settings.display_locale,
        settings.display_name.clone(),
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match parse_command(&line) {
            Command::Quit => break,
            Command::Reload => session.reload().await,
            Command::Switch(conversation_id) => session.switch_conversation(conversation_id).await,
            Command::Send(text) => {
                session.set_draft(text);
                session.send_draft().await.map(|_| ())
            }
        };
        if let Err(e) = result {
            notify(e, settings.display_locale);
        }
    }

    session.deactivate().await;
    renderer.abort();
    Ok(())
}
