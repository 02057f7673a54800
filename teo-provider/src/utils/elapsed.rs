//! Per-handler log id and timing.

use std::time::Instant;

/// Fresh id correlating the log lines of one handler call.
pub fn log_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Logs how long a handler took when dropped.
pub struct Elapsed {
    name: String,
    log_id: String,
    start: Instant,
}

impl Elapsed {
    pub fn new(name: impl Into<String>, log_id: &str) -> Self {
        Self {
            name: name.into(),
            log_id: log_id.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for Elapsed {
    fn drop(&mut self) {
        log::debug!(
            "{} [ELAPSED] {} took {}ms",
            self.log_id,
            self.name,
            self.start.elapsed().as_millis()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ids_are_unique_uuids() {
        let a = log_id();
        let b = log_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
