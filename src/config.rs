use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub moderation: ModerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Private group whose posts are relayed outward.
    pub analyst_group_id: i64,
    /// Public group receiving relayed posts and subject to moderation.
    pub open_group_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    /// The single allowed outward contact reference, e.g. "@admin".
    pub admin_contact: String,
    #[serde(default = "default_spam_keywords")]
    pub spam_keywords: Vec<String>,
}

fn default_spam_keywords() -> Vec<String> {
    [
        "buy now",
        "click here",
        "limited offer",
        "free money",
        "guaranteed profit",
        "investment opportunity",
        "make money fast",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("telegram.bot_token must not be empty");
        }
        if self.telegram.analyst_group_id == self.telegram.open_group_id {
            bail!("telegram.analyst_group_id and telegram.open_group_id must differ");
        }
        if !self.moderation.admin_contact.starts_with('@') {
            bail!(
                "moderation.admin_contact must start with '@', got {:?}",
                self.moderation.admin_contact
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_default_keywords() {
        let config = parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            analyst_group_id = -1001
            open_group_id = -1002

            [moderation]
            admin_contact = "@admin"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.analyst_group_id, -1001);
        assert!(config
            .moderation
            .spam_keywords
            .contains(&"free money".to_string()));
    }

    #[test]
    fn test_rejects_contact_without_at() {
        let err = parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            analyst_group_id = -1001
            open_group_id = -1002

            [moderation]
            admin_contact = "admin"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("admin_contact"));
    }

    #[test]
    fn test_rejects_identical_groups() {
        assert!(parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            analyst_group_id = -1001
            open_group_id = -1001

            [moderation]
            admin_contact = "@admin"
            "#,
        )
        .is_err());
    }
}
