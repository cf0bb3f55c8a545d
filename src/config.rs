use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub smtp: SmtpConfig,
    pub smtp_timeout: Duration,
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_email: String,
}

impl SmtpConfig {
    pub fn is_valid(&self) -> bool {
        !self.host.is_empty()
            && self.port > 0
            && !self.user.is_empty()
            && !self.pass.is_empty()
            && !self.from_email.is_empty()
    }
}

/// Resolves the full service configuration from the process environment.
/// Missing or unparsable values fall back to defaults silently; validity of
/// the SMTP block is decided later by [`SmtpConfig::is_valid`].
pub fn load_config() -> Config {
    Config {
        port: positive_port(env::var("PORT").ok(), DEFAULT_PORT),
        smtp: SmtpConfig {
            host: env::var("SMTP_HOST").unwrap_or_default(),
            port: positive_port(env::var("SMTP_PORT").ok(), DEFAULT_SMTP_PORT),
            user: env::var("SMTP_USER").unwrap_or_default(),
            pass: env::var("SMTP_PASS").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL").unwrap_or_default(),
        },
        smtp_timeout: timeout_secs(env::var("SMTP_TIMEOUT_SECS").ok()),
        trust_forwarded_for: bool_flag(env::var("TRUST_FORWARDED_FOR").ok()),
    }
}

fn positive_port(raw: Option<String>, default: u16) -> u16 {
    raw.and_then(|s| s.parse::<u16>().ok())
        .filter(|&port| port > 0)
        .unwrap_or(default)
}

fn timeout_secs(raw: Option<String>) -> Duration {
    raw.and_then(|s| s.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SMTP_TIMEOUT)
}

fn bool_flag(raw: Option<String>) -> bool {
    raw.map(|s| {
        let s = s.trim();
        s == "1" || s.eq_ignore_ascii_case("true")
    })
    .unwrap_or(false)
}
