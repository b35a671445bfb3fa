use std::env;

/// Application configuration, gathered from the environment at startup.
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Origin of the browser frontend, used for CORS and OAuth redirects.
    pub frontend_url: String,
    pub google: GoogleConfig,
}

/// Google OAuth application credentials.
///
/// These may be empty when the deployment does not use Google sign-in; the
/// OAuth routes then fail at use rather than preventing startup.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let google = GoogleConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            callback_url: env::var("GOOGLE_CALLBACK_URL").unwrap_or_default(),
        };
        if google.client_id.is_empty() {
            log::warn!("GOOGLE_CLIENT_ID not set; Google sign-in and calendar routes will fail");
        }

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            google,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.frontend_url, "http://localhost:3000");

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("FRONTEND_URL", "https://tasks.example.com");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.frontend_url, "https://tasks.example.com");
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
    }
}
