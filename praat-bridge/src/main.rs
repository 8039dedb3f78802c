use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use praat_bridge::cli::{self, ConfigFile, ScriptSource};
use praat_bridge::config::Config;
use praat_bridge::dialect::run_script_with_argv;
use tracing::{warn, Level};

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("praat-bridge: {e}");
            eprintln!("Usage: praat-bridge [-f[<rcfile>]] [-c<script>] [-td] [<script-file> | -] [<arg>...]");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(if args.debug { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let script_argv = args.script_argv();

    // ── Load the rc file describing the dry-run host ──────────────────────────
    let config = match args.config {
        ConfigFile::Skip => Config::new(),
        ConfigFile::Explicit(path) => load_config(&path),
        ConfigFile::Search => cli::find_user_config()
            .map(|path| load_config(&path))
            .unwrap_or_default(),
    };

    // ── Read the script ───────────────────────────────────────────────────────
    let script = match args.source {
        ScriptSource::Inline(s) => s,
        ScriptSource::File(path) => match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("praat-bridge: {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        ScriptSource::Stdin => {
            let mut s = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut s) {
                eprintln!("praat-bridge: stdin: {e}");
                std::process::exit(1);
            }
            s
        }
    };

    // ── Run it ────────────────────────────────────────────────────────────────
    let host = Arc::new(config.build_host());
    run_script_with_argv(host.clone(), &script, &script_argv);

    print!("{}", host.take_echoed());
    if args.transcript {
        for cmd in host.commands() {
            let marker = if cmd.divert { ">>" } else { ">" };
            println!("{marker} {}", cmd.command);
        }
    }
}

/// Load an rc file, warning about (but not stopping on) problems.
fn load_config(path: &Path) -> Config {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                warn!("{}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("praat-bridge: warning: {}: {e}", path.display());
            Config::new()
        }
    }
}
