use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub word_length: usize,
    pub max_guesses: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            word_length: env::var("WORD_LENGTH")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("Invalid WORD_LENGTH"),
            max_guesses: env::var("MAX_GUESSES")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .expect("Invalid MAX_GUESSES"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
