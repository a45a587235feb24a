use anyhow::Context;
use stepper_app::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let start_url = std::env::args().nth(1);
    let config =
        AppConfig::from_env(start_url.as_deref()).context("start url argument is not a url")?;
    stepper_app::run_app(config)
}
