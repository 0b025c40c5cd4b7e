use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "kube-lograb",
    version,
    about = "Follow the logs of ready Kubernetes containers into local files"
)]
pub struct Cli {
    /// Path to the kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config, then in-cluster)
    #[arg(long = "kubeconfig")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long = "context")]
    pub context: Option<String>,

    /// Namespace
    #[arg(short = 'n', long = "namespace", default_value = "default")]
    pub namespace: String,

    /// Label selector (e.g. che.workspace_id or app=web,tier=frontend)
    #[arg(short = 'l', long = "selector")]
    pub selector: Option<String>,

    /// Directory the log files are written to
    #[arg(short = 'o', long = "out-dir", default_value = "out/pod_logs")]
    pub out_dir: PathBuf,

    /// Maximum number of containers followed at once (unlimited when unset)
    #[arg(long = "max-followers")]
    pub max_followers: Option<usize>,

    /// Dev mode: simulate pods without a cluster
    #[arg(long = "dev", default_value_t = false)]
    pub dev: bool,

    /// Dev: milliseconds between lines (and between pod events)
    #[arg(long = "dev-rate-ms", default_value_t = 500)]
    pub dev_rate_ms: u64,

    /// Dev: lines per container before its stream ends (0 = never end)
    #[arg(long = "dev-lines", default_value_t = 10)]
    pub dev_lines: u64,
}
