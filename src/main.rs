//! mafia-engine binary entrypoint wiring the console host to the rules engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use futures::{FutureExt, future::BoxFuture};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mafia_engine::{
    commands::{self, CommandRegistry},
    config::AppConfig,
    dao::MafiaDao,
    services::AppContext,
    transport::{CommandContext, Transport, TransportResult},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let dao = MafiaDao::new(&config.db);
    let transport = Arc::new(ConsoleTransport::default());
    let default_topic = config.thread.unwrap_or(1);

    let app = AppContext {
        dao,
        transport,
        config,
    };
    let registry = CommandRegistry::with_defaults();
    debug!(
        commands = %registry.names().collect::<Vec<_>>().join(", "),
        "registered commands"
    );

    commands::bootstrap(&app)
        .await
        .context("bootstrapping configured game")?;

    info!("reading commands from stdin; format: <username> !<command> [args]");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let Some((name, ctx)) = parse_line(line, default_topic) else {
            println!("expected `<username> !<command> [args]`");
            continue;
        };
        commands::dispatch(&app, &registry, &name, &ctx).await;
    }

    Ok(())
}

/// Split one console line into a command name and its invocation context.
fn parse_line(line: &str, topic_id: u64) -> Option<(String, CommandContext)> {
    let mut words = line.split_whitespace();
    let author = words.next()?.trim_end_matches(':').to_string();
    let command = words.next()?.strip_prefix('!')?.to_string();
    let args: Vec<String> = words.map(str::to_string).collect();

    let ctx = CommandContext {
        author,
        topic_id: Some(topic_id),
        chat_id: None,
        args,
        input: line.to_string(),
        parent_body: line.to_string(),
    };
    Some((command, ctx))
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Console transport: replies go to stdout, chat rooms are numbered locally.
#[derive(Debug, Default)]
struct ConsoleTransport {
    next_chat_id: AtomicU64,
}

impl Transport for ConsoleTransport {
    fn resolve_username<'a>(
        &'a self,
        ctx: &'a CommandContext,
    ) -> BoxFuture<'a, TransportResult<String>> {
        async move { Ok(ctx.author.trim_start_matches('@').to_string()) }.boxed()
    }

    fn reply<'a>(
        &'a self,
        _ctx: &'a CommandContext,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>> {
        println!("{text}");
        async { Ok(()) }.boxed()
    }

    fn reply_with_template<'a>(
        &'a self,
        _ctx: &'a CommandContext,
        template: &'a str,
        data: serde_json::Value,
    ) -> BoxFuture<'a, TransportResult<()>> {
        println!("[{template}] {data}");
        async { Ok(()) }.boxed()
    }

    fn report_error<'a>(
        &'a self,
        _ctx: &'a CommandContext,
        prefix: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>> {
        println!("{prefix}{message}");
        async { Ok(()) }.boxed()
    }

    fn reply_in_topic<'a>(
        &'a self,
        topic_id: u64,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>> {
        println!("[thread {topic_id}] {text}");
        async { Ok(()) }.boxed()
    }

    fn reply_in_chat<'a>(
        &'a self,
        chat_id: u64,
        text: &'a str,
    ) -> BoxFuture<'a, TransportResult<()>> {
        println!("[chat {chat_id}] {text}");
        async { Ok(()) }.boxed()
    }

    fn create_chat<'a>(
        &'a self,
        users: &'a [String],
        body: &'a str,
        title: &'a str,
    ) -> BoxFuture<'a, TransportResult<u64>> {
        let id = 1000 + self.next_chat_id.fetch_add(1, Ordering::SeqCst);
        println!("[chat {id} created: \"{title}\" with {}] {body}", users.join(", "));
        async move { Ok(id) }.boxed()
    }
}
