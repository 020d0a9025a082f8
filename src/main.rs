use chat_sync::common::init;
use chat_sync::settings::AppSettings;
use chat_sync::workers::daemons;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::get();
    init::initialize_logging(settings);
    match settings.app_component.as_str() {
        "chat-console" => daemons::chat_console::serve(settings).await,
        component => anyhow::bail!("Unknown app component: {component}"),
    }
}
