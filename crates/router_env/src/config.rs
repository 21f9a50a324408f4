//! Environment-awareness: which deployment environment is this process
//! running in, read once at startup from `RUN_ENV`.

use crate::Env;

pub fn current_env() -> Env {
    match std::env::var("RUN_ENV").as_deref() {
        Ok("production") => Env::Production,
        Ok("sandbox") => Env::Sandbox,
        _ => Env::Development,
    }
}
