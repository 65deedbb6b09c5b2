use cluster_wizard::models::context::LaunchParams;
use cluster_wizard::LaunchOptions;
use std::path::PathBuf;

fn value_of(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{}=", flag);
    args.iter().enumerate().find_map(|(i, a)| {
        if let Some(v) = a.strip_prefix(&prefix) {
            Some(v.to_string())
        } else if a == flag {
            args.get(i + 1).cloned()
        } else {
            None
        }
    })
    .filter(|v| !v.trim().is_empty())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: cluster-wizard [--config <file>] [--flow s3|catalog|cluster|driver]");
        println!("                      [--import] [--name <name>] [--duplicate-name <name>]");
        println!("                      [--connected-to-repo] [--step <step>]");
        println!("       cluster-wizard --tui-smoke[=<step>]");
        println!("       cluster-wizard --probe");
        return;
    }

    let config = value_of(&args, "--config").map(PathBuf::from);

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific step and exits 0.
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        cluster_wizard::run_tui_smoke(config, target);
        return;
    }

    // Backend reachability check: shim list and security flag, exits 0/1.
    if args.iter().any(|a| a == "--probe") {
        cluster_wizard::run_probe(config);
        return;
    }

    let opts = LaunchOptions {
        config,
        flow: value_of(&args, "--flow"),
        import: args.iter().any(|a| a == "--import"),
        launch: LaunchParams {
            name: value_of(&args, "--name"),
            duplicate_name: value_of(&args, "--duplicate-name"),
            connected_to_repo: args.iter().any(|a| a == "--connected-to-repo"),
        },
        step: value_of(&args, "--step"),
    };
    cluster_wizard::run_tui(opts);
}
