use colored::Colorize;
use common::env_config::Config;
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

/// Installs the global logger: colored levels on stdout plus the configured
/// log file. Does nothing and returns `false` when console logging is off.
pub fn setup(config: &Config) -> Result<bool, fern::InitError> {
    if !config.console_logging_enabled {
        return Ok(false);
    }

    let level = if config.is_production() {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Debug
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            let color = match record.level() {
                log::Level::Info => "green",
                log::Level::Warn => "yellow",
                log::Level::Error => "red",
                log::Level::Debug => "magenta",
                log::Level::Trace => "bright black",
            };
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.target(),
                record.level().to_string().color(color),
                message
            ))
        })
        .level(level)
        .level_for("sqlx", log::LevelFilter::Warn)
        .level_for("actix_server", log::LevelFilter::Warn)
        .level_for("mio", log::LevelFilter::Off)
        .chain(std::io::stdout())
        .chain(fern::log_file(&config.log_file)?)
        .apply()?;
    Ok(true)
}

/// Request logging, one line per request when console logging is enabled.
pub fn middleware(config: &Config) -> LoggerMiddleware {
    LoggerMiddleware::new(config.console_logging_enabled)
}

#[cfg(test)]
mod tests {
    use common::env_config::JwtConfig;

    use super::*;

    fn config(console_logging_enabled: bool) -> Config {
        Config {
            environment: "test".to_string(),
            database_url: String::new(),
            jwt_config: JwtConfig {
                secret: "logger-secret".to_string(),
                expiration_hours: 1,
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            num_workers: 1,
            cors_allowed_origins: Vec::new(),
            console_logging_enabled,
            // unwritable, so any attempt to open it fails
            log_file: "/nonexistent-crm-logs/server.log".to_string(),
            admin: None,
        }
    }

    #[test]
    fn disabled_console_logging_installs_nothing() {
        assert!(!setup(&config(false)).unwrap());
    }

    #[test]
    fn enabled_console_logging_opens_the_log_file() {
        assert!(setup(&config(true)).is_err());
    }
}
