use std::time::Duration;

/// Campus API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// How often the event-reminder sweep runs.
    pub reminder_sweep_interval: Duration,
    /// Optional platform admin seeded at startup.
    pub admin_seed: Option<AdminSeed>,
}

/// Credentials for the platform admin created on boot when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset or unparsable values fall back to
    /// their defaults.
    pub fn from_env() -> Self {
        let admin_seed = match (optional_var("ADMIN_EMAIL"), optional_var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: optional_var("ADMIN_NAME").unwrap_or_else(|| "Campus Admin".to_string()),
            }),
            _ => None,
        };

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            reminder_sweep_interval: Duration::from_secs(
                std::env::var("REMINDER_SWEEP_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(300),
            ),
            admin_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            reminder_sweep_interval: Duration::from_secs(300),
            admin_seed: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
