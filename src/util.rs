const ICINGA_URL: &str = "ICINGA_URL";

pub fn get_url() -> Option<String> {
    std::env::var(ICINGA_URL).ok()
}

const ICINGA_USERNAME: &str = "ICINGA_USERNAME";

pub fn get_username() -> Option<String> {
    std::env::var(ICINGA_USERNAME).ok()
}

const ICINGA_PASSWORD: &str = "ICINGA_PASSWORD";

pub fn get_password() -> Option<String> {
    std::env::var(ICINGA_PASSWORD).ok()
}

const ICINGA_DEBUG: &str = "ICINGA_DEBUG";

/// `ICINGA_DEBUG` accepts `true`/`false`, `1`/`0` and `yes`/`no`, in any case.
/// Any other value is ignored.
pub fn get_debug() -> Option<bool> {
    let debug_from_env = std::env::var(ICINGA_DEBUG);
    debug_from_env.ok().and_then(|res| parse_flag(&res))
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Load a `.env` file from the working directory, if there is one.
pub fn load_env() {
    dotenv::dotenv().ok();
}
