//! `medassist chat` - answer one message

use crate::bootstrap::Services;
use anyhow::Result;
use medassist_core::{format_error_for_cli, ChatInput, Language};
use medassist_llm::Capability;

pub async fn run(
    services: &Services,
    message: String,
    conversation: Option<String>,
    capability: Option<Capability>,
    language: Option<Language>,
    json: bool,
) -> Result<()> {
    let mut input = ChatInput::new(message);
    if let Some(conversation) = conversation {
        input = input.with_conversation(conversation);
    }
    if let Some(capability) = capability {
        input = input.with_capability(capability);
    }
    if let Some(language) = language {
        input = input.with_language(language);
    }

    let reply = match services.orchestrator.handle(input).await {
        Ok(reply) => reply,
        Err(e) => {
            eprintln!("{}", format_error_for_cli(&e));
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!("{}", reply.content);
    println!();
    let mut status = format!(
        "conversation {} · {} ({})",
        reply.conversation_id, reply.backend, reply.model
    );
    if reply.withheld {
        status.push_str(" · reply withheld by safety validation");
    }
    if reply.degraded {
        status.push_str(" · degraded");
    }
    eprintln!("{status}");
    Ok(())
}
