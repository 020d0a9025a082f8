use crate::common::datetime::Locale;
use crate::common::env::FromEnv;
use std::env;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    fn from_env(env_var: &str) -> anyhow::Result<Self> {
        match env::var(env_var).ok().as_deref() {
            None | Some("compact") => Ok(LogFormat::Compact),
            Some("json") => Ok(LogFormat::Json),
            Some(other) => anyhow::bail!("{env_var}: unknown log format `{other}`"),
        }
    }
}

pub struct AppSettings {
    pub app_component: String,
    pub level: Level,
    pub log_format: LogFormat,

    pub chat_service_base_url: String,
    pub chat_service_token: Option<String>,
    pub chat_service_timeout: Duration,

    pub realtime_url: String,
    pub realtime_key: Option<String>,
    pub realtime_connection_timeout: Duration,

    pub conversation_id: Option<i64>,
    pub display_locale: Locale,
    pub display_name: String,
}

impl AppSettings {
    pub fn load_from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        let app_component = env::var("APP_COMPONENT")?;
        let level = Level::from_env_or("LOG_LEVEL", Level::INFO)?;
        let log_format = LogFormat::from_env("LOG_FORMAT")?;

        let chat_service_base_url = env::var("CHAT_SERVICE_BASE_URL")?;
        let chat_service_token = env::var("CHAT_SERVICE_TOKEN").ok();
        let chat_service_timeout_secs = u64::from_env_or("CHAT_SERVICE_TIMEOUT_SECS", 10)?;
        let chat_service_timeout = Duration::from_secs(chat_service_timeout_secs);

        let realtime_url = env::var("REALTIME_URL")?;
        let realtime_key = env::var("REALTIME_KEY").ok();
        let realtime_connection_timeout_secs =
            u64::from_env_or("REALTIME_CONNECTION_TIMEOUT_SECS", 5)?;
        let realtime_connection_timeout = Duration::from_secs(realtime_connection_timeout_secs);

        let conversation_id = match env::var_os("CONVERSATION_ID") {
            Some(_) => Some(i64::from_env("CONVERSATION_ID")?),
            None => None,
        };
        let display_locale = Locale::from_env_or("DISPLAY_LOCALE", Locale::English)?;
        let display_name = env::var("DISPLAY_NAME").unwrap_or_else(|_| "You".to_string());

        Ok(AppSettings {
            app_component,
            level,
            log_format,

            chat_service_base_url,
            chat_service_token,
            chat_service_timeout,

            realtime_url,
            realtime_key,
            realtime_connection_timeout,

            conversation_id,
            display_locale,
            display_name,
        })
    }

    pub fn get() -> &'static AppSettings {
        settings()
    }
}

pub fn settings() -> &'static AppSettings {
    static SETTINGS: LazyLock<AppSettings> =
        LazyLock::new(|| AppSettings::load_from_env().expect("Failed to load settings"));
    SETTINGS.deref()
}
