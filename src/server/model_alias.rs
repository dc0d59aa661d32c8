use std::collections::BTreeMap;

use crate::config::ModelsConfig;
use crate::error::{RelayError, Result};

/// 不可变的别名 → 上游模型标识映射，启动时构建一次
#[derive(Debug, Clone)]
pub struct ModelTable {
    aliases: BTreeMap<String, String>,
    default_alias: String,
}

impl ModelTable {
    pub fn from_config(cfg: &ModelsConfig) -> Result<Self> {
        if !cfg.aliases.contains_key(&cfg.default) {
            return Err(RelayError::Config(format!(
                "default model alias '{}' is not configured",
                cfg.default
            )));
        }
        Ok(Self {
            aliases: cfg.aliases.clone(),
            default_alias: cfg.default.clone(),
        })
    }

    pub fn default_alias(&self) -> &str {
        &self.default_alias
    }

    /// Aliases in sorted order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// 解析请求中的别名；缺省时使用默认别名。返回 (别名, 上游标识)
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> Result<(&'a str, &'a str)> {
        let alias = requested.unwrap_or(self.default_alias.as_str());
        match self.aliases.get_key_value(alias) {
            Some((alias, identifier)) => Ok((alias.as_str(), identifier.as_str())),
            None => Err(self.invalid_model()),
        }
    }

    pub fn invalid_model(&self) -> RelayError {
        RelayError::Validation(format!(
            "Invalid model. Choose from: {}",
            self.aliases().collect::<Vec<_>>().join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ModelTable {
        ModelTable::from_config(&ModelsConfig::default()).unwrap()
    }

    #[test]
    fn resolves_known_alias() {
        let t = table();
        assert_eq!(
            t.resolve(Some("mistral")).unwrap(),
            ("mistral", "mistralai/mistral-7b-instruct:free")
        );
    }

    #[test]
    fn missing_alias_uses_default() {
        let t = table();
        assert_eq!(
            t.resolve(None).unwrap(),
            ("gemini", "google/gemini-2.5-flash")
        );
    }

    #[test]
    fn unknown_alias_lists_valid_choices() {
        let err = table().resolve(Some("llama")).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid model. Choose from: gemini, mistral");
    }

    #[test]
    fn alias_match_is_case_sensitive() {
        assert!(table().resolve(Some("Gemini")).is_err());
    }

    #[test]
    fn rejects_default_outside_table() {
        let cfg = ModelsConfig {
            default: "llama".into(),
            ..ModelsConfig::default()
        };
        assert!(ModelTable::from_config(&cfg).is_err());
    }
}
