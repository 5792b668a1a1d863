use thiserror::Error;

#[derive(Error, Debug)]
pub enum LnbotError {
    #[error("no config found, run 'lnbot init' first")]
    ConfigMissing,

    #[error("wallet {0:?} not found in config")]
    NotFound(String),

    /// Resolution with nothing to resolve to: the registry holds no wallets.
    #[error("no wallets configured, run 'lnbot wallet create --name <name>'")]
    NoWallets,

    #[error("no active wallet, run 'lnbot wallet use <name>'")]
    NoActiveWallet,

    #[error("active wallet {0:?} not found in config")]
    ActiveWalletMissing(String),

    #[error("wallet {0:?} already exists in config")]
    Conflict(String),

    /// Structured error returned by the wallet service.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("watch failed: {0}")]
    WatchFailed(String),

    #[error("{action}: {source}")]
    Action {
        action: String,
        #[source]
        source: Box<LnbotError>,
    },

    /// The service rotated the key but the registry could not be written.
    #[error("key rotated but config not saved ({source}); new key: {key}")]
    RotatedKeyNotSaved {
        key: String,
        #[source]
        source: Box<LnbotError>,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("not supported in the CLI, {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LnbotError {
    /// Tags a remote or transport failure with the action that was attempted.
    pub fn context(self, action: impl Into<String>) -> Self {
        LnbotError::Action {
            action: action.into(),
            source: Box::new(self),
        }
    }

    /// Whether re-running the same command could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LnbotError::Transport(_) | LnbotError::WatchFailed(_) => true,
            LnbotError::Remote { status, .. } => *status >= 500,
            LnbotError::Action { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LnbotError {
    fn from(err: reqwest::Error) -> Self {
        LnbotError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LnbotError>;
