use crate::common::datetime::Locale;
use std::fmt::{Display, Formatter};
use tracing::error;

pub type ServiceResult<T> = Result<T, AppError>;

/// Logs the underlying cause and reports it to the caller as `error`.
#[track_caller]
pub fn fail<T, E: Into<anyhow::Error>>(error: AppError, e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!(
        code = error.code(),
        "{} ({caller}): {:#}",
        error.message(),
        e.into()
    );
    Err(error)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    Unexpected,

    HistoryLoadFailed,

    SendFailed,

    SubscriptionError,

    SessionInactive,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        let caller = std::panic::Location::caller();
        error!("An unexpected error has occurred at {caller}: {}", e.into());
        AppError::Unexpected
    }
}

impl AppError {
    pub const fn as_str(&self) -> &str {
        self.code()
    }

    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",

            AppError::HistoryLoadFailed => "history.load_failed",

            AppError::SendFailed => "messages.send_failed",

            AppError::SubscriptionError => "realtime.subscription_error",

            AppError::SessionInactive => "sessions.inactive",
        }
    }

    /// User-facing notice for this error.
    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",

            AppError::HistoryLoadFailed => "Previous messages could not be loaded.",

            AppError::SendFailed => {
                "An error occurred while sending the message. It has not been sent."
            }

            AppError::SubscriptionError => "Live updates are currently unavailable.",

            AppError::SessionInactive => "This conversation is no longer open.",
        }
    }

    /// `message()` in the reader's language.
    pub const fn notice(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.message(),
            Locale::Spanish => match self {
                AppError::Unexpected => "Ocurrió un error inesperado.",

                AppError::HistoryLoadFailed => "No fue posible cargar los mensajes anteriores.",

                AppError::SendFailed => {
                    "Ocurrió un error al enviar el mensaje. El mensaje no ha sido enviado."
                }

                AppError::SubscriptionError => {
                    "Las actualizaciones en tiempo real no están disponibles."
                }

                AppError::SessionInactive => "Esta conversación ya no está abierta.",
            },
        }
    }

    /// Whether a presenter should show this error to the user, or only log it.
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, AppError::SubscriptionError)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
