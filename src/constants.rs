//! Built-in defaults
//!
//! Values used when neither a flag nor the config file provides one.

/// Gmail search expression selecting the threads to answer.
pub const DEFAULT_QUERY: &str = "in:inbox is:unread to:me category:personal";

/// Reply body sent to every unanswered sender.
pub const DEFAULT_MESSAGE: &str = "This is an autoresponse to your referenced email. \
I received your email while out of the office. I am now slowly going through my inbox. \
If you wish to ensure your email is looked at, please reply now.";

/// File holding just the OAuth client ID, used when `--client-id` is empty.
pub const DEFAULT_CLIENT_ID_FILE: &str = "clientid.dat";

/// File holding just the OAuth client secret, used when `--secret` is empty.
pub const DEFAULT_SECRET_FILE: &str = "clientsecret.dat";

/// Date format accepted for `--start-date` / `--end-date` and used in queries.
pub const QUERY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Base URL of the Gmail REST API, scoped to the authorized user.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Headers requested per message; nothing else is read.
pub const THREAD_METADATA_HEADERS: [&str; 3] = ["From", "Subject", "Message-ID"];

/// HTTP timeout for every mail service request in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// How long to wait for the browser to complete OAuth authorization.
pub const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Service name under which refresh tokens are kept in the OS keyring.
pub const KEYRING_SERVICE: &str = "autoreply";
