use std::path::PathBuf;

use crate::cli::Cli;
use crate::errors::{AppError, AppResult};

/// Where pod events and log streams come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceConfig {
    Kube {
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
    },
    Dev {
        rate_ms: u64,
        max_lines: Option<u64>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub namespace: String,
    pub selector: Option<String>,
    pub out_dir: PathBuf,
    pub max_followers: Option<usize>,
    pub source: SourceConfig,
}

impl TryFrom<Cli> for Config {
    type Error = AppError;

    fn try_from(cli: Cli) -> AppResult<Self> {
        let namespace = cli.namespace.trim().to_string();
        if namespace.is_empty() {
            return Err(AppError::Cli("namespace must not be empty".into()));
        }

        if cli.max_followers == Some(0) {
            return Err(AppError::Cli("--max-followers must be at least 1".into()));
        }

        let selector = cli
            .selector
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let source = if cli.dev {
            SourceConfig::Dev {
                rate_ms: cli.dev_rate_ms,
                max_lines: (cli.dev_lines > 0).then_some(cli.dev_lines),
            }
        } else {
            SourceConfig::Kube {
                kubeconfig: cli.kubeconfig,
                context: cli.context,
            }
        };

        Ok(Self {
            namespace,
            selector,
            out_dir: cli.out_dir,
            max_followers: cli.max_followers,
            source,
        })
    }
}
