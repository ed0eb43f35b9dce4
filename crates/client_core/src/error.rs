use thiserror::Error;

/// Failure classes of a transport call.
///
/// `Display` is the diagnostic form and keeps the underlying cause;
/// [`TransportError::user_message`] is the localized text shown to users.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("server returned status {code}")]
    Status { code: u16, body: Vec<u8> },
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(_) => "Неверный URL.".to_string(),
            Self::Status { code, .. } => format!("Сервер вернул код {code}."),
            Self::Decode(err) => format!("Ошибка декодирования: {err}"),
            Self::Transport(description) => description.clone(),
            Self::Cancelled => "Запрос отменён.".to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            Self::Transport(format!("failed to read response body: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
