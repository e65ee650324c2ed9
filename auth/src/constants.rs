//! Fixed names and defaults for the magic-link flow.

/// Name the email-link strategy registers under.
pub const STRATEGY_NAME: &str = "email-link";

/// Environment variable holding the magic link secret.
pub const MAGIC_LINK_SECRET_VAR: &str = "MAGIC_LINK_SECRET";

/// Path the magic link points at.
pub const CALLBACK_PATH: &str = "/magic";

/// Session key the sealed link is stored under while pending.
pub const SESSION_MAGIC_LINK_KEY: &str = "triggerdotdev:magiclink";

/// Session key for the email a link was sent to.
pub const SESSION_EMAIL_KEY: &str = "auth:email";

/// Session key for the last authentication error.
pub const SESSION_ERROR_KEY: &str = "auth:error";

/// Session key for the authenticated user id.
pub const SESSION_USER_KEY: &str = "user";

/// Query parameter carrying the link token.
pub const TOKEN_PARAM: &str = "token";

/// Form field carrying the email address.
pub const EMAIL_FIELD: &str = "email";

/// Default link lifetime in minutes.
pub const DEFAULT_LINK_TTL_MINUTES: i64 = 30;
