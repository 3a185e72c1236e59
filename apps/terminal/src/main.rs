mod command;
mod config;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::ChatClient;
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    command::Command,
    config::{load_settings, Args},
    render::Renderer,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = load_settings(&args)?;

    info!(backend_url = %settings.backend_url, "terminal: starting chat client");
    let client = ChatClient::start(settings.client_config())?;

    let mut events = client.subscribe_events();
    let printer = tokio::spawn(async move {
        let mut renderer = Renderer::default();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = renderer.render(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "terminal: renderer fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if args.auto_connect {
        client.connect(&settings.username).await?;
    }

    let mut lines = LinesStream::new(BufReader::new(stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = line.context("failed to read stdin")?;
        match Command::parse(&line) {
            Command::Connect(name) => {
                let name = name.as_deref().unwrap_or(&settings.username);
                if !client.view().await.can_connect() {
                    println!("-- already connected; /disconnect first");
                    continue;
                }
                client.connect(name).await?;
            }
            Command::Disconnect => client.disconnect().await?,
            Command::Quit => break,
            Command::Say(content) => {
                if !client.view().await.can_send(&content) {
                    println!("-- not connected; use /connect [name]");
                    continue;
                }
                client.send(&content).await?;
            }
            Command::Unknown(name) => println!("-- unknown command /{name}"),
            Command::Empty => {}
        }
    }

    client.shutdown().await;
    let _ = printer.await;
    Ok(())
}
