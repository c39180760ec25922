//! Catalog authority constants

/// Path of the credential exchange endpoint, relative to the API base URL
pub const AUTH_PATH: &str = "/auth";

/// Environment variable holding the API username
pub const USERNAME_ENV: &str = "MOVIE_API_USERNAME";

/// Environment variable holding the API password
pub const PASSWORD_ENV: &str = "MOVIE_API_PASSWORD";

/// Environment variable holding the API base URL
pub const BASE_URL_ENV: &str = "MOVIE_API_BASE_URL";
