mod allocator;
mod app;
mod cipher;
mod config;
mod error;
mod file;
mod processor;
mod secret;
mod status;
mod types;
mod ui;
mod worker;

use crate::app::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    App::init()?.execute().await
}
