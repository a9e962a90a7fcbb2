#![allow(dead_code)]

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

// Global lock to serialize env var tests
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the env lock and restores every touched variable when dropped
pub struct TestEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl TestEnv {
    /// Lock the environment and switch into test mode
    pub fn test_mode() -> Self {
        let mut env = Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        };
        env.set("APP_ENV", "test");
        env
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.save(key);
        env::set_var(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.save(key);
        env::remove_var(key);
    }

    fn save(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), env::var_os(key)));
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
    }
}
