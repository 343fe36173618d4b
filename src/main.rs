//! JN Deploy Agent - private repository deployer for ephemeral test sites
//!
//! Usage:
//! - Normal mode: `jn-deploy-agent`
//! - With custom port: `jn-deploy-agent --port 19999`

use jn_deploy_agent::RuntimeConfig;

/// Parse command line arguments
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("JN Deploy Agent - private repository deployer for ephemeral test sites");
    println!();
    println!("USAGE:");
    println!("    jn-deploy-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    DEPLOY_AGENT_API_KEY  API key required on incoming requests");
    println!("    GH_USERNAME           Source-control username for private clones");
    println!("    GH_PAT                Source-control access token for private clones");
    println!("    DEPLOY_ON_ERROR       'abort' (default) or 'continue'");
    println!("    NODE_INSTALLER_PATH   Node bootstrap script uploaded to new sites");
    println!("    PORT                  Listening port (default 9876)");
}

fn main() {
    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    rt.block_on(async {
        jn_deploy_agent::init_and_run(config).await;
    });
}
