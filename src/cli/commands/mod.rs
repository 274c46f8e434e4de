use clap::{Parser, Subcommand};

pub mod handlers;
pub mod types;

pub use handlers::dispatch;
pub use types::ChatCommand;

use crate::router::ContentType;

/// REACH - AI content engine for real estate professionals.
#[derive(Parser, Debug)]
#[command(name = "reach")]
#[command(version = "0.1.0")]
#[command(about = "Generate real estate marketing content with AI.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one piece of content and print it
    Generate {
        /// What to write about
        prompt: String,

        /// Content type (research, blog, linkedin, instagram, image, strategy)
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,

        /// Session to attach the generation to
        #[arg(short, long)]
        session: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat with quick-action shortcuts
    Chat {
        /// Resume an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List recently generated content from the store
    Recent {
        /// Filter by content type
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,

        /// Maximum records to show
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Start the HTTP gateway
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show configuration and guardrail status
    Status,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use crate::router::ContentType;
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate_with_type_and_session() {
        let cli = Cli::parse_from([
            "reach",
            "generate",
            "a blog post about staging",
            "--type",
            "blog",
            "--session",
            "abc",
        ]);

        match cli.command {
            Commands::Generate {
                prompt,
                content_type,
                session,
                json,
            } => {
                assert_eq!(prompt, "a blog post about staging");
                assert_eq!(content_type, Some(ContentType::Blog));
                assert_eq!(session.as_deref(), Some("abc"));
                assert!(!json);
            }
            other => panic!("expected generate command, got {other:?}"),
        }
    }

    #[test]
    fn content_type_parses_case_insensitively() {
        let cli = Cli::parse_from(["reach", "recent", "--type", "LinkedIn"]);
        match cli.command {
            Commands::Recent { content_type, .. } => {
                assert_eq!(content_type, Some(ContentType::Linkedin));
            }
            other => panic!("expected recent command, got {other:?}"),
        }
    }

    #[test]
    fn serve_defaults_to_localhost() {
        let cli = Cli::parse_from(["reach", "serve"]);
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, 8080);
                assert_eq!(host, "127.0.0.1");
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
