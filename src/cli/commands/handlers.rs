use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Input;
use tracing::info;
use uuid::Uuid;

use super::types::ChatCommand;
use super::{Cli, Commands};
use crate::agents::QueryHandler;
use crate::config::Config;
use crate::guardrails::{BlockReason, GuardrailManager, GuardrailStatus};
use crate::pipeline::{ContentPipeline, ContentRequest, ContentResponse};
use crate::prompt::PromptLibrary;
use crate::providers::ProviderSet;
use crate::router::ContentType;
use crate::session::SessionStore;
use crate::storage::ContentStore;
use crate::ui::style as ui;

const CHAT_HELP: &str = "/blog <topic>      -- Write a blog post\n\
/linkedin <topic>  -- Write a LinkedIn post\n\
/instagram <topic> -- Write an Instagram caption\n\
/image <prompt>    -- Generate a property image\n\
/research <topic>  -- Research a market topic\n\
/strategy <goal>   -- Draft a content strategy\n\
/new               -- Start a new session\n\
/status            -- Show configuration status\n\
/quit              -- Leave the chat";

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Generate {
            prompt,
            content_type,
            session,
            json,
        } => {
            let pipeline = build_pipeline(&config).await?;
            run_generate(&pipeline, &config, prompt, content_type, session, json).await
        }

        Commands::Chat { session } => {
            let pipeline = build_pipeline(&config).await?;
            run_chat(&pipeline, &config, session).await
        }

        Commands::Recent {
            content_type,
            limit,
        } => run_recent(&config, content_type, limit).await,

        Commands::Serve { port, host } => {
            let pipeline = Arc::new(build_pipeline(&config).await?);
            info!("Starting REACH gateway on {host}:{port}");
            crate::gateway::run_gateway(&host, port, pipeline, Arc::new(config)).await
        }

        Commands::Status => run_status(&config),
    }
}

/// Wire providers, guardrails, sessions, and the content store from config.
pub async fn build_pipeline(config: &Config) -> Result<ContentPipeline> {
    let providers = ProviderSet::from_config(config);
    let guardrails = build_guardrails(config, &providers);
    let sessions = Arc::new(SessionStore::new());

    let db_path = config.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create content store directory")?;
    }
    let store = Arc::new(ContentStore::open(&db_path).await?);

    Ok(ContentPipeline::new(providers, guardrails, sessions)?.with_store(store))
}

/// Semantic checks need a configured key; without one the classifier stays
/// unset and strict mode falls back to word lists alone.
fn build_guardrails(config: &Config, providers: &ProviderSet) -> GuardrailManager {
    let classifier = config
        .gemini_api_key
        .as_ref()
        .map(|_| Arc::clone(&providers.text));
    GuardrailManager::new(config.guardrails, classifier)
}

async fn run_generate(
    pipeline: &ContentPipeline,
    config: &Config,
    prompt: String,
    content_type: Option<ContentType>,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let mut request = ContentRequest::new(prompt);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }
    if let Some(session) = session {
        request = request.with_session(session);
    }

    let response = pipeline.process(request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print_response(pipeline, config, &response);

    if !response.success && response.blocked_by.is_none() {
        anyhow::bail!(
            "generation failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn run_chat(
    pipeline: &ContentPipeline,
    config: &Config,
    session: Option<String>,
) -> Result<()> {
    let prompts = PromptLibrary::new()?;
    let mut session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    println!();
    println!("  {} {}", ui::accent("*"), ui::header("REACH chat"));
    println!(
        "  {}",
        ui::dim("Type /help for commands, /quit to leave.")
    );
    println!();

    loop {
        let line: String = match Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }

        let request = match ChatCommand::parse(&trimmed) {
            Some(ChatCommand::Quit) => break,
            Some(ChatCommand::Help) => {
                println!("{}", QueryHandler::help_text());
                println!();
                println!("{}", ui::dim(CHAT_HELP));
                continue;
            }
            Some(ChatCommand::New) => {
                session_id = Uuid::new_v4().to_string();
                println!("{}", ui::dim("Started a new session."));
                continue;
            }
            Some(ChatCommand::Status) => {
                println!("{}", render_status(config, &pipeline.guardrail_status()));
                continue;
            }
            Some(ChatCommand::Unknown(word)) => {
                println!(
                    "{}",
                    ui::yellow(format!(
                        "Unknown command: /{word}. Type /help for commands."
                    ))
                );
                continue;
            }
            Some(ChatCommand::QuickAction {
                content_type,
                input,
            }) => {
                let rewritten = match prompts.quick_action(content_type, &input) {
                    Ok(rewritten) => rewritten,
                    Err(error) => {
                        tracing::warn!(%error, "quick action template failed, using raw input");
                        input
                    }
                };
                ContentRequest::new(rewritten)
                    .with_content_type(content_type)
                    .with_session(session_id.clone())
            }
            None => ContentRequest::new(trimmed).with_session(session_id.clone()),
        };

        let response = pipeline.process(request).await;
        print_response(pipeline, config, &response);
    }

    println!("{}", ui::dim("Goodbye."));
    Ok(())
}

async fn run_recent(
    config: &Config,
    content_type: Option<ContentType>,
    limit: i64,
) -> Result<()> {
    let db_path = config.expanded_db_path();
    if !db_path.exists() {
        println!(
            "{}",
            ui::dim("No content store yet. Generate something first.")
        );
        return Ok(());
    }

    let store = ContentStore::open(&db_path).await?;
    let records = store.recent(content_type, limit, None).await?;

    if records.is_empty() {
        println!("{}", ui::dim("No stored content matches."));
        return Ok(());
    }

    for record in &records {
        println!(
            "{} {} {}",
            ui::accent(format!("[{}]", record.content_type)),
            ui::dim(&record.created_at),
            ui::dim(&record.session_id),
        );
        println!("  {}", preview(&record.content, 100));
    }
    println!();
    println!("{}", ui::dim(format!("{} record(s)", records.len())));
    Ok(())
}

fn run_status(config: &Config) -> Result<()> {
    let providers = ProviderSet::from_config(config);
    let guardrails = build_guardrails(config, &providers);
    println!("{}", render_status(config, &guardrails.status()));
    Ok(())
}

fn print_response(pipeline: &ContentPipeline, config: &Config, response: &ContentResponse) {
    if let Some(reason) = response.blocked_by {
        println!();
        println!("{}", ui::yellow(format!("Request blocked ({reason})")));
        println!("{}", response.content);
        if reason == BlockReason::Topical {
            let suggestions = pipeline.topic_suggestions();
            if !suggestions.is_empty() {
                println!();
                println!("{}", ui::dim("Try topics like:"));
                for topic in suggestions.iter().take(5) {
                    println!("  {} {topic}", ui::accent("-"));
                }
            }
        }
        return;
    }

    if !response.success {
        println!(
            "{}",
            ui::yellow(format!(
                "Generation failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            ))
        );
        return;
    }

    println!();
    println!("{}", response.content);
    println!();
    match response.quality_score {
        Some(score) => {
            println!(
                "{}",
                ui::dim(format!(
                    "[{} | quality {score:.2} | session {}]",
                    response.content_type, response.session_id
                ))
            );
            if score < config.min_quality_score {
                println!(
                    "{}",
                    ui::yellow(format!(
                        "Quality {score:.2} is below the configured minimum {:.2}.",
                        config.min_quality_score
                    ))
                );
            }
        }
        None => println!(
            "{}",
            ui::dim(format!(
                "[{} | session {}]",
                response.content_type, response.session_id
            ))
        ),
    }

    if !response.suggestions.is_empty() {
        println!("{}", ui::dim("Suggestions:"));
        for suggestion in &response.suggestions {
            println!("  {} {suggestion}", ui::accent("-"));
        }
    }
}

pub fn render_status(config: &Config, guardrails: &GuardrailStatus) -> String {
    let lines = vec![
        "◆ REACH Status".to_string(),
        String::new(),
        format!("Version   {}", env!("CARGO_PKG_VERSION")),
        format!("Config    {}", config.config_path.display()),
        format!("Store     {}", config.expanded_db_path().display()),
        String::new(),
        format!("  Model            {}", config.model),
        format!("  Image model      {}", config.image_model),
        format!("  Temperature      {:.1}", config.temperature),
        format!("  Max tokens       {}", config.max_tokens),
        format!(
            "  Gemini key       {}",
            if config.gemini_api_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        ),
        format!(
            "  Search key       {}",
            if config.serp_api_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        ),
        String::new(),
        format!(
            "  Topical guard    {}",
            if guardrails.topical_active { "active" } else { "off" }
        ),
        format!(
            "  Safety guard     {}",
            if guardrails.safety_active { "active" } else { "off" }
        ),
        format!(
            "  Classifier       {}",
            if guardrails.classifier_available {
                "available"
            } else {
                "none"
            }
        ),
        format!("  Quality floor    {:.2}", config.min_quality_score),
        format!("  Session timeout  {} min", config.session_timeout_minutes),
    ];
    lines.join("\n")
}

fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.replace('\n', " ");
    let mut out: String = flat.chars().take(max_chars).collect();
    if flat.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
