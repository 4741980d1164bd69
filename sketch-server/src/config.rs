use std::env;

use sketch_core::SessionRules;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub words_file: String,
    pub round_seconds: u32,
    pub partial_reveal_at: u32,
    pub grace_seconds: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            words_file: env::var("WORDS_FILE").unwrap_or_else(|_| "./words.txt".to_string()),
            round_seconds: env::var("ROUND_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("Invalid ROUND_SECONDS"),
            partial_reveal_at: env::var("PARTIAL_REVEAL_AT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .expect("Invalid PARTIAL_REVEAL_AT"),
            grace_seconds: env::var("GRACE_SECONDS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("Invalid GRACE_SECONDS"),
        }
    }

    pub fn session_rules(&self) -> SessionRules {
        SessionRules {
            round_seconds: self.round_seconds,
            partial_reveal_at: self.partial_reveal_at,
            grace_seconds: self.grace_seconds,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
