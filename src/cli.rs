//! CLI argument parsing via clap.

use std::path::PathBuf;

use clap::Parser;

use kubectl_debug::build_info;
use kubectl_debug::cluster::ClusterOptions;
use kubectl_debug::config::CliOverrides;

const AFTER_HELP: &str = "\
Examples:
  # debug the first container of pod web-0 with the default image and shell
  kubectl-debug web-0

  # debug the sidecar container with a custom image and command
  kubectl-debug web-0 -c sidecar --image busybox -- sh -c 'ps aux'

  # reach an agent listening on a non-default port
  kubectl-debug web-0 -p 10086";

/// Run a debug container next to a running pod container, sharing its
/// namespaces, and attach your terminal to it.
#[derive(Debug, Parser)]
#[command(
    name = "kubectl-debug",
    version,
    long_version = build_info::LONG_VERSION,
    after_help = AFTER_HELP
)]
pub struct Args {
    /// Pod to debug.
    pub pod: Option<String>,

    /// Command to run in the debug container (default from config, else `bash`).
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// Target container (default: the pod's first container).
    #[arg(short = 'c', long = "container")]
    pub container: Option<String>,

    /// Image for the debug container.
    #[arg(long = "image")]
    pub image: Option<String>,

    /// Port the node debug agent listens on.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Path to the debug config file (default: ~/.kube/debug-config).
    #[arg(long = "debug-config", value_name = "PATH")]
    pub debug_config: Option<String>,

    /// Namespace of the pod (default: from the kubeconfig context).
    #[arg(short = 'n', long = "namespace")]
    pub namespace: Option<String>,

    /// Kubeconfig context to use.
    #[arg(long = "context")]
    pub context: Option<String>,

    /// Path to the kubeconfig file.
    #[arg(long = "kubeconfig", value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Log session progress to stderr.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            pod: self.pod.clone(),
            namespace: self.namespace.clone(),
            container: self.container.clone(),
            image: self.image.clone(),
            agent_port: self.port,
            command: self.command.clone(),
        }
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        }
    }
}
