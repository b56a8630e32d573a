//! Run configuration.
//!
//! Settings come from command-line flags, a JSON file, or both. Both sources
//! produce a [`RawConfig`]; flags are merged over the file and the result is
//! validated into a [`RunConfig`] before any browser is started.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::domain::{Credentials, EmailSettings, RowWindow, SearchCriteria, ValidationError};
use crate::reservation::PollPolicy;
use crate::session::SessionConfig;
use crate::browser::ChromeConfig;

/// Error loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// A required setting was not given
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A setting failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Unvalidated settings, as read from flags or a JSON file.
///
/// Keys match the JSON file format. `user`, `dt` and `tm` accept either a
/// string or a bare number, since membership numbers and dates are often
/// written unquoted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawConfig {
    #[serde(default, deserialize_with = "string_or_number")]
    pub user: Option<String>,
    pub psw: Option<String>,
    pub dpt: Option<String>,
    pub arr: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dt: Option<String>,
    #[serde(default, deserialize_with = "hour_string_or_number")]
    pub tm: Option<String>,
    pub stnum: Option<usize>,
    pub num: Option<usize>,
    pub reserve: Option<bool>,

    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub app_password: Option<String>,

    /// Chrome executable to launch
    pub chrome: Option<PathBuf>,
    /// Attach to a running Chrome's DevTools endpoint instead of launching one
    pub devtools_url: Option<String>,
    pub headless: Option<bool>,

    pub max_attempts: Option<u64>,
    pub max_duration_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(u64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
    }))
}

/// Like [`string_or_number`], but `8` becomes `"08"`.
fn hour_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => format!("{n:02}"),
    }))
}

impl RawConfig {
    /// Load settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlay `overrides` on these settings. Values present in `overrides` win.
    pub fn merge(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            user: overrides.user.or(self.user),
            psw: overrides.psw.or(self.psw),
            dpt: overrides.dpt.or(self.dpt),
            arr: overrides.arr.or(self.arr),
            dt: overrides.dt.or(self.dt),
            tm: overrides.tm.or(self.tm),
            stnum: overrides.stnum.or(self.stnum),
            num: overrides.num.or(self.num),
            reserve: overrides.reserve.or(self.reserve),
            sender: overrides.sender.or(self.sender),
            recipient: overrides.recipient.or(self.recipient),
            app_password: overrides.app_password.or(self.app_password),
            chrome: overrides.chrome.or(self.chrome),
            devtools_url: overrides.devtools_url.or(self.devtools_url),
            headless: overrides.headless.or(self.headless),
            max_attempts: overrides.max_attempts.or(self.max_attempts),
            max_duration_secs: overrides.max_duration_secs.or(self.max_duration_secs),
        }
    }

    /// Validate the settings and build the run configuration.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let window = RowWindow::new(
            self.stnum.unwrap_or(RowWindow::DEFAULT_START),
            self.num.unwrap_or(RowWindow::DEFAULT_COUNT),
        )?;
        let criteria = SearchCriteria::new(
            &required(self.dpt, "dpt")?,
            &required(self.arr, "arr")?,
            &required(self.dt, "dt")?,
            &required(self.tm, "tm")?,
            window,
            self.reserve.unwrap_or(false),
        )?;

        let credentials =
            Credentials::new(required(self.user, "user")?, required(self.psw, "psw")?);

        let email_parts = [&self.sender, &self.recipient, &self.app_password];
        let any_email = email_parts.iter().any(|part| part.is_some());
        let email = EmailSettings::from_parts(self.sender, self.recipient, self.app_password);
        if any_email && email.is_none() {
            tracing::warn!("email settings incomplete, notifications disabled");
        }

        let mut chrome = ChromeConfig::default().with_headless(self.headless.unwrap_or(false));
        if let Some(path) = self.chrome {
            chrome = chrome.with_executable(path);
        }
        if let Some(url) = self.devtools_url {
            chrome = chrome.with_devtools_url(url);
        }
        let session = SessionConfig::new(chrome);

        let mut policy = PollPolicy::default();
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.max_duration_secs {
            policy = policy.with_max_duration_secs(secs);
        }

        Ok(RunConfig {
            credentials,
            criteria,
            email,
            session,
            policy,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub criteria: SearchCriteria,
    /// `None` disables notifications
    pub email: Option<EmailSettings>,
    pub session: SessionConfig,
    pub policy: PollPolicy,
}
