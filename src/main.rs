use dioxus::prelude::*;
use policysheet::config::AppConfig;
use policysheet::ui::app::App;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = AppConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(preview_buffer = %config.preview_buffer.display(), "starting policysheet");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new().with_window(
                dioxus::desktop::WindowBuilder::new()
                    .with_title("Policy Sheet")
                    .with_inner_size(dioxus::desktop::LogicalSize::new(1280.0, 820.0)),
            ),
        )
        .with_context(config)
        .launch(App);
}
