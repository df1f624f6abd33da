use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NodeError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timeout waiting for sensor")]
    Timeout,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Map a boxed hardware-seam error to a typed NodeError.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> NodeError {
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        NodeError::Timeout
    } else {
        NodeError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fake(&'static str);

    impl std::fmt::Display for Fake {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Fake {}

    #[test]
    fn timeout_text_maps_to_timeout() {
        assert!(matches!(
            map_hw_error(&Fake("HX711 Timeout waiting for data")),
            NodeError::Timeout
        ));
    }

    #[test]
    fn anything_else_maps_to_hardware() {
        let err = map_hw_error(&Fake("bus fault"));
        assert!(matches!(&err, NodeError::Hardware(s) if s == "bus fault"));
    }
}
