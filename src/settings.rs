use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

use crate::models::{AttributeMapping, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SamlGateSettings {
    pub application: ApplicationSettings,
    pub frontend: FrontendSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
    pub sp: ServiceProviderSettings,
    pub providers: Vec<ProviderSeedSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL of this gateway; assertion-consumer
    /// endpoints handed to IdPs are derived from it
    pub redirect_base_url: String,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendSettings {
    /// Base URL of the single-page application users land on after SSO
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Lifetime of minted access tokens
    pub token_ttl_minutes: i64,
    pub session_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceProviderSettings {
    /// SP entity ID presented to IdPs; defaults to `redirect_base_url`
    /// when left empty
    pub entity_id: String,
}

/// Provider registered at startup from configuration, before any admin
/// API calls are possible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSeedSettings {
    pub name: String,
    pub entity_id: String,
    pub sso_url: String,
    pub sso_logout_url: Option<String>,
    pub certificate: String,
    pub auto_provision: bool,
    pub default_role: UserRole,
    pub attribute_mapping: Option<AttributeMapping>,
    pub is_active: bool,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            redirect_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 60,
            session_secret: String::new(), // Will be generated if empty
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SamlGateSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment initialization fails
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment variables and logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `SAMLGATE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("SAMLGATE_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                let secrets_settings: Self = basic_toml::from_str(&secrets_toml_content)?;

                println!("✓ Overriding settings from {}", secrets_path.display());
                settings = secrets_settings;
            } else {
                println!(
                    "ℹ SAMLGATE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_frontend_env_overrides(&mut settings.frontend);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_sp_env_overrides(&mut settings.sp);
    }

    /// Apply environment overrides for application settings
    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for frontend settings
    fn apply_frontend_env_overrides(frontend_settings: &mut FrontendSettings) {
        if let Ok(base_url) = std::env::var("FRONTEND_BASE_URL") {
            frontend_settings.base_url = base_url;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(ttl_str) = std::env::var("TOKEN_TTL_MINUTES") {
            if let Ok(ttl) = ttl_str.parse::<i64>() {
                session_settings.token_ttl_minutes = ttl;
            }
        }

        Self::handle_session_secret_override(session_settings);
    }

    /// Helper function to handle session secret environment override and generation
    fn handle_session_secret_override(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        // Generate random session secret if no environment variable was set
        // and current value is empty
        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// Generate a cryptographically secure random session secret
    ///
    /// Generates 32 bytes (256 bits) of entropy for AES-256 compatibility
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32]; // 256 bits for AES-256
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    /// Display warnings about using a generated session secret
    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 Minted tokens and state cookies will not survive a restart");
        eprintln!("   unless the secret is explicitly configured");
    }

    /// Apply environment overrides for cookie settings
    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Apply environment overrides for SP settings
    fn apply_sp_env_overrides(sp_settings: &mut ServiceProviderSettings) {
        if let Ok(entity_id) = std::env::var("SP_ENTITY_ID") {
            sp_settings.entity_id = entity_id;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    /// SP entity ID presented to IdPs, falling back to the gateway base URL
    #[must_use]
    pub fn sp_entity_id(&self) -> &str {
        if self.sp.entity_id.is_empty() {
            &self.application.redirect_base_url
        } else {
            &self.sp.entity_id
        }
    }

    /// Assertion-consumer endpoint for a provider. Request-derived: the
    /// provider ID is a path segment, so this differs per provider and the
    /// SSO strategy must be rebuilt around it on every request.
    #[must_use]
    pub fn callback_url_for(&self, provider_id: Uuid) -> String {
        format!(
            "{}/saml/callback/{provider_id}",
            self.application.redirect_base_url
        )
    }

    /// Frontend page users are sent to after a failed SSO attempt
    #[must_use]
    pub fn frontend_login_url(&self) -> String {
        format!("{}/login", self.frontend.base_url)
    }

    /// Frontend page that consumes the minted access token
    #[must_use]
    pub fn frontend_auth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.frontend.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        std::env::remove_var("SESSION_SECRET");
        std::env::remove_var("TOKEN_TTL_MINUTES");
        std::env::remove_var("FRONTEND_BASE_URL");
        std::env::remove_var("SP_ENTITY_ID");
        std::env::remove_var("SAMLGATE_SECRETS_DIR");
    }

    #[test]
    fn test_session_defaults() {
        let default_session_settings = SessionSettings::default();
        assert_eq!(default_session_settings.session_secret, "");
        assert_eq!(default_session_settings.token_ttl_minutes, 60);
    }

    #[test]
    #[serial]
    fn test_session_secret_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            token_ttl_minutes: 60,
            session_secret: "default-secret".to_string(),
        };

        std::env::set_var("SESSION_SECRET", "env-override-secret");
        SamlGateSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.session_secret, "env-override-secret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_token_ttl_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            token_ttl_minutes: 60,
            session_secret: "test-secret".to_string(),
        };

        std::env::set_var("TOKEN_TTL_MINUTES", "15");
        SamlGateSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.token_ttl_minutes, 15);
        assert_eq!(session_settings.session_secret, "test-secret"); // Should remain unchanged

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_secret_auto_generation() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            token_ttl_minutes: 60,
            session_secret: String::new(), // Empty, should trigger auto-generation
        };

        SamlGateSettings::apply_session_env_overrides(&mut session_settings);

        assert!(!session_settings.session_secret.is_empty());
        assert!(session_settings.session_secret.len() > 40); // Base64 encoded 32 bytes should be ~44 chars

        // Generate another one to ensure they're different
        let mut session_settings2 = SessionSettings {
            token_ttl_minutes: 60,
            session_secret: String::new(),
        };
        SamlGateSettings::apply_session_env_overrides(&mut session_settings2);

        assert_ne!(
            session_settings.session_secret,
            session_settings2.session_secret
        );

        clean_env_vars();
    }

    #[test]
    fn test_sp_entity_id_fallback() {
        let mut settings = SamlGateSettings::default();
        assert_eq!(settings.sp_entity_id(), "http://localhost:8080");

        settings.sp.entity_id = "https://sp.voyager.example".to_string();
        assert_eq!(settings.sp_entity_id(), "https://sp.voyager.example");
    }

    #[test]
    fn test_callback_url_embeds_provider_id() {
        let settings = SamlGateSettings::default();
        let provider_id = Uuid::new_v4();
        let url = settings.callback_url_for(provider_id);

        assert_eq!(
            url,
            format!("http://localhost:8080/saml/callback/{provider_id}")
        );
    }

    #[test]
    fn test_frontend_urls() {
        let settings = SamlGateSettings::default();
        assert_eq!(settings.frontend_login_url(), "http://localhost:3000/login");
        assert_eq!(
            settings.frontend_auth_callback_url(),
            "http://localhost:3000/auth/callback"
        );
    }
}
