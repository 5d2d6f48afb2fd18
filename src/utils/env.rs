// src/utils/env.rs
use log::{debug, info};

/// Load variables from a `.env` file when one is present. A missing file is
/// not an error; the process environment is used as-is.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded ({}); using process environment", e),
    }
}
