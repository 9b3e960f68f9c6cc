use std::env;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub generator: GeneratorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            db_path: env::var("PHOTO_FINDER_DB_PATH")
                .unwrap_or_else(|_| "./data/photo-finder.db".to_string()),
            generator: GeneratorConfig {
                base_url: env::var("PHOTO_FINDER_OLLAMA_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
                model: env::var("PHOTO_FINDER_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
                timeout_secs: env::var("PHOTO_FINDER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            },
        })
    }
}
