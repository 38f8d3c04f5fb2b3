//! Environment readiness check.

use crate::config::Config;
use crate::reader::chromium::find_chrome;
use anyhow::Result;

/// Check Chrome availability, configuration, and the session profile.
pub async fn run() -> Result<()> {
    println!("Slotwatch Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let mut ready = true;

    // Chrome binary
    match find_chrome() {
        Some(path) => println!("[OK] Chrome found: {}", path.display()),
        None => {
            println!("[!!] Chrome NOT found. Install Chrome/Chromium or set WATCH_CHROME_PATH.");
            ready = false;
        }
    }

    // Configuration
    match Config::from_env() {
        Ok(config) => {
            println!("[OK] {} target(s) configured:", config.targets.len());
            for t in &config.targets {
                println!("       {} -> {}", t.name, t.url);
            }

            if config.session_dir.exists() {
                println!("[OK] Session profile: {}", config.session_dir.display());
            } else {
                println!(
                    "[!!] Session profile {} missing. Run `slotwatch login` first.",
                    config.session_dir.display()
                );
                ready = false;
            }

            match (&config.smtp, &config.telegram) {
                (None, None) => {
                    println!("[??] No notifier credentials set; alerts will only be logged.")
                }
                (smtp, telegram) => {
                    if smtp.is_some() {
                        println!("[OK] Email notifications enabled");
                    }
                    if telegram.is_some() {
                        println!("[OK] Telegram notifications enabled");
                    }
                }
            }

            println!(
                "     intervals: check {}s, heartbeat {}s, cooldown {}s",
                config.check_interval.as_secs(),
                config.heartbeat_interval.as_secs(),
                config.cooldown.as_secs()
            );
        }
        Err(e) => {
            println!("[!!] Configuration error: {e:#}");
            ready = false;
        }
    }

    println!();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        std::process::exit(1);
    }

    Ok(())
}
