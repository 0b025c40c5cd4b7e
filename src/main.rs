use kube_lograb::{cli::Cli, config::Config, errors::AppResult};

#[tokio::main]
async fn main() -> AppResult<()> {
    kube_lograb::logging::init();

    let cli = <Cli as clap::Parser>::parse();
    let config = Config::try_from(cli)?;

    kube_lograb::run(config).await
}
