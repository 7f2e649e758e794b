//! Whether asset requests should be proxied to the dev server.

/// True in development, and in test unless running under CI.
pub fn should_proxy(mode: &str, ci: bool) -> bool {
    mode == "development" || (mode == "test" && !ci)
}
