use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::assistant::models::{
    ConversationTurn, ConverseRequest, ConverseResponse, Decision, PendingActionReply,
};
use crate::assistant::provider::{StaticToken, TokenSource};
use crate::core::AppConfig;
use crate::core::db::{async_db, find_refresh_token};
use crate::google::RefreshingToken;

// Older turns are dropped, the prompt only looks at the last few anyway
const MAX_HISTORY: usize = 10;

async fn token_source(config: &AppConfig, account: Option<String>) -> Result<Arc<dyn TokenSource>> {
    let Some(account) = account else {
        // Small talk still works, anything touching the calendar asks to
        // connect an account
        return Ok(Arc::new(StaticToken::new("")));
    };
    let db = async_db(&config.db_path).await?;
    match find_refresh_token(&db, &account).await? {
        Some(refresh_token) => Ok(Arc::new(RefreshingToken::new(
            &config.google_token_url,
            &config.google_client_id,
            &config.google_client_secret,
            &refresh_token,
        ))),
        None => {
            println!("No stored credentials for {}, run `auth` first.", account);
            Ok(Arc::new(StaticToken::new("")))
        }
    }
}

fn print_reply(resp: &ConverseResponse) {
    println!("{}", resp.response);
    for event in resp
        .matching_events
        .iter()
        .chain(resp.events.iter())
        .flatten()
    {
        println!("  - {} ({} - {})", event.title, event.start, event.end);
    }
    for task in resp
        .matching_tasks
        .iter()
        .chain(resp.tasks.iter())
        .flatten()
    {
        match task.due_date {
            Some(due) => println!("  - {} (due {})", task.title, due),
            None => println!("  - {}", task.title),
        }
    }
}

pub async fn run(config: AppConfig, account: Option<String>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let tokens = token_source(&config, account).await?;
    let assistant = Assistant::from_config(&config, tokens);
    let lang = assistant.language();

    let mut history: Vec<ConversationTurn> = vec![];

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let request = ConverseRequest {
                    message: line.clone(),
                    conversation_history: history.clone(),
                    pending_action: None,
                };
                let resp = match assistant.converse(request, assistant.now()).await {
                    Ok(resp) => resp,
                    Err(err) => {
                        tracing::debug!("{}", err);
                        println!("{}", err.user_message(lang));
                        continue;
                    }
                };
                print_reply(&resp);
                history.push(ConversationTurn::user(&line));
                history.push(ConversationTurn::assistant(&resp.response));

                if let Some(action) = resp.pending_action {
                    let answer = rl.readline("confirm? [y/N] ")?;
                    let decision = if answer.trim().eq_ignore_ascii_case("y") {
                        Decision::Confirm
                    } else {
                        Decision::Cancel
                    };
                    let request = ConverseRequest {
                        pending_action: Some(PendingActionReply { decision, action }),
                        ..Default::default()
                    };
                    match assistant.converse(request, assistant.now()).await {
                        Ok(done) => {
                            print_reply(&done);
                            history.push(ConversationTurn::assistant(&done.response));
                        }
                        Err(err) => println!("{}", err.user_message(lang)),
                    }
                }

                if history.len() > MAX_HISTORY {
                    history.drain(..history.len() - MAX_HISTORY);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
