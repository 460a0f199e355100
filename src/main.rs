//! `kernbench` binary: run every configured suite and print its report.
//!
//! Configuration comes from `KERNBENCH_CONFIG` / `KERNBENCH_*` (see
//! [`kernbench::BenchConfig::load`]); set `KERNBENCH_FORMAT=json` for JSON
//! reports. Logging is controlled by `RUST_LOG` (default `info`).

use std::env;
use std::process;

use kernbench::session::{exit_code_for, BenchSession};
use kernbench::BenchConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let json = env::var("KERNBENCH_FORMAT").map(|f| f.eq_ignore_ascii_case("json")).unwrap_or(false);

    let code = match run(json) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("kernbench: {e}");
            exit_code_for(&e)
        }
    };
    process::exit(code);
}

fn run(json: bool) -> kernbench::BenchResult<i32> {
    let config = BenchConfig::load()?;
    log::debug!("Configuration: {config:?}");
    let mut session = BenchSession::new(config)?;
    let summary = session.run_all()?;
    for outcome in &summary.outcomes {
        if json {
            println!("{}", outcome.report.to_json());
        } else {
            println!("{}", outcome.report.to_table());
        }
    }
    if summary.all_passed() {
        log::info!("All verifications passed");
    } else {
        log::error!("One or more verifications failed");
    }
    Ok(summary.exit_code())
}
