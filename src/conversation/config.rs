//! Conversation configuration.
//!
//! `ConversationConfig` is immutable once built and is shared by reference
//! for the whole conversation. `ConversationSettings` is its serializable
//! counterpart, read from a config file and validated into a config.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::termination::{DEFAULT_TERMINATION_MARKER, TerminationMarker, TerminationPredicate};
use crate::error::ConfigError;
use crate::executor::CodeExecutor;

/// Default cap on characters of execution output fed back to the responder
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 30_000;

/// When the executor hands the turn to a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanInputMode {
    /// Ask before every executor reply
    Always,
    /// Never ask; terminate when the budget runs out
    Never,
    /// Ask only once the budget runs out
    OnTerminate,
}

impl FromStr for HumanInputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(HumanInputMode::Always),
            "never" => Ok(HumanInputMode::Never),
            "on_terminate" | "on-terminate" | "terminate" => Ok(HumanInputMode::OnTerminate),
            other => Err(ConfigError::UnknownHumanInputMode(other.to_string())),
        }
    }
}

impl fmt::Display for HumanInputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HumanInputMode::Always => "always",
            HumanInputMode::Never => "never",
            HumanInputMode::OnTerminate => "on_terminate",
        };
        f.write_str(name)
    }
}

/// Validated, immutable configuration for one conversation
#[derive(Clone)]
pub struct ConversationConfig {
    pub max_auto_replies: u32,
    pub human_input_mode: HumanInputMode,
    pub termination_predicate: Arc<dyn TerminationPredicate>,
    pub executor: Arc<dyn CodeExecutor>,
    pub working_dir: PathBuf,
    /// Executor reply to a responder message with no code in it
    pub default_auto_reply: String,
    pub max_output_chars: usize,
}

impl ConversationConfig {
    pub fn builder() -> ConversationConfigBuilder {
        ConversationConfigBuilder::default()
    }
}

impl fmt::Debug for ConversationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationConfig")
            .field("max_auto_replies", &self.max_auto_replies)
            .field("human_input_mode", &self.human_input_mode)
            .field("working_dir", &self.working_dir)
            .field("default_auto_reply", &self.default_auto_reply)
            .field("max_output_chars", &self.max_output_chars)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConversationConfig`]; `build` rejects invalid values
pub struct ConversationConfigBuilder {
    max_auto_replies: i64,
    human_input_mode: HumanInputMode,
    termination_predicate: Option<Arc<dyn TerminationPredicate>>,
    executor: Option<Arc<dyn CodeExecutor>>,
    working_dir: PathBuf,
    default_auto_reply: String,
    max_output_chars: usize,
}

impl Default for ConversationConfigBuilder {
    fn default() -> Self {
        Self {
            max_auto_replies: 10,
            human_input_mode: HumanInputMode::OnTerminate,
            termination_predicate: None,
            executor: None,
            working_dir: PathBuf::from("."),
            default_auto_reply: String::new(),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }
}

impl ConversationConfigBuilder {
    pub fn max_auto_replies(mut self, n: i64) -> Self {
        self.max_auto_replies = n;
        self
    }

    pub fn human_input_mode(mut self, mode: HumanInputMode) -> Self {
        self.human_input_mode = mode;
        self
    }

    pub fn termination_predicate(mut self, predicate: impl TerminationPredicate + 'static) -> Self {
        self.termination_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn default_auto_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_auto_reply = reply.into();
        self
    }

    pub fn max_output_chars(mut self, n: usize) -> Self {
        self.max_output_chars = n;
        self
    }

    pub fn build(self) -> Result<ConversationConfig, ConfigError> {
        if self.max_auto_replies < 0 {
            return Err(ConfigError::NegativeBudget(self.max_auto_replies));
        }
        let executor = self.executor.ok_or(ConfigError::Missing("executor"))?;
        if self.working_dir.as_os_str().is_empty() {
            return Err(ConfigError::WorkingDirectory("path is empty".to_string()));
        }

        Ok(ConversationConfig {
            max_auto_replies: u32::try_from(self.max_auto_replies).unwrap_or(u32::MAX),
            human_input_mode: self.human_input_mode,
            termination_predicate: self
                .termination_predicate
                .unwrap_or_else(|| Arc::new(TerminationMarker::default())),
            executor,
            working_dir: self.working_dir,
            default_auto_reply: self.default_auto_reply,
            max_output_chars: self.max_output_chars,
        })
    }
}

/// File-level conversation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Signed so that a negative value in a file is reported, not misparsed
    pub max_auto_replies: i64,
    pub human_input_mode: HumanInputMode,
    pub termination_marker: String,
    pub working_dir: PathBuf,
    pub default_auto_reply: String,
    pub max_output_chars: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_auto_replies: 10,
            human_input_mode: HumanInputMode::OnTerminate,
            termination_marker: DEFAULT_TERMINATION_MARKER.to_string(),
            working_dir: PathBuf::from("coding"),
            default_auto_reply: String::new(),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
        }
    }
}

impl ConversationSettings {
    /// Validate into a config that runs code through `executor`
    pub fn into_config(self, executor: Arc<dyn CodeExecutor>) -> Result<ConversationConfig, ConfigError> {
        ConversationConfig::builder()
            .max_auto_replies(self.max_auto_replies)
            .human_input_mode(self.human_input_mode)
            .termination_predicate(TerminationMarker::new(self.termination_marker))
            .executor(executor)
            .working_dir(self.working_dir)
            .default_auto_reply(self.default_auto_reply)
            .max_output_chars(self.max_output_chars)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::executor::LocalCommandExecutor;

    fn executor() -> Arc<dyn CodeExecutor> {
        Arc::new(LocalCommandExecutor::default())
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConversationConfig::builder().executor(executor()).build().unwrap();
        assert_eq!(config.max_auto_replies, 10);
        assert_eq!(config.human_input_mode, HumanInputMode::OnTerminate);
        assert_eq!(config.working_dir, PathBuf::from("."));
        assert!(config.default_auto_reply.is_empty());
        assert!(
            config
                .termination_predicate
                .is_termination(&Message::responder("done TERMINATE"))
        );
    }

    #[test]
    fn test_negative_budget_rejected() {
        let err = ConversationConfig::builder()
            .executor(executor())
            .max_auto_replies(-1)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NegativeBudget(-1));
    }

    #[test]
    fn test_zero_budget_accepted() {
        let config = ConversationConfig::builder()
            .executor(executor())
            .max_auto_replies(0)
            .build()
            .unwrap();
        assert_eq!(config.max_auto_replies, 0);
    }

    #[test]
    fn test_missing_executor_rejected() {
        let err = ConversationConfig::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::Missing("executor"));
    }

    #[test]
    fn test_empty_working_dir_rejected() {
        let err = ConversationConfig::builder()
            .executor(executor())
            .working_dir("")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::WorkingDirectory(_)));
    }

    #[test]
    fn test_human_input_mode_parse() {
        assert_eq!("always".parse::<HumanInputMode>().unwrap(), HumanInputMode::Always);
        assert_eq!("NEVER".parse::<HumanInputMode>().unwrap(), HumanInputMode::Never);
        assert_eq!("on-terminate".parse::<HumanInputMode>().unwrap(), HumanInputMode::OnTerminate);
        assert!(matches!(
            "sometimes".parse::<HumanInputMode>(),
            Err(ConfigError::UnknownHumanInputMode(_))
        ));
        assert_eq!(HumanInputMode::OnTerminate.to_string(), "on_terminate");
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = "max_auto_replies: 3\nhuman_input_mode: never\ntermination_marker: DONE\n";
        let settings: ConversationSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.max_auto_replies, 3);
        assert_eq!(settings.human_input_mode, HumanInputMode::Never);
        assert_eq!(settings.working_dir, PathBuf::from("coding"));

        let config = settings.into_config(executor()).unwrap();
        assert!(config.termination_predicate.is_termination(&Message::responder("DONE")));
        assert!(!config.termination_predicate.is_termination(&Message::responder("TERMINATE")));
    }

    #[test]
    fn test_settings_negative_budget() {
        let settings: ConversationSettings = serde_yaml::from_str("max_auto_replies: -5").unwrap();
        let err = settings.into_config(executor()).unwrap_err();
        assert_eq!(err, ConfigError::NegativeBudget(-5));
    }
}
