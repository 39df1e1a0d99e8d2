//! Terminal navigator.

use async_trait::async_trait;
use mirrorhop_core::{Navigator, Result};

use crate::output::OutputFormat;

/// "Navigates" by printing the redirect URL on stdout.
///
/// In JSON mode the URL is part of the final document instead, so nothing
/// is printed here.
#[derive(Debug, Clone, Copy)]
pub struct StdoutNavigator {
    format: OutputFormat,
}

impl StdoutNavigator {
    /// Create a navigator for the given output format.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl Navigator for StdoutNavigator {
    async fn navigate(&self, url: &str) -> Result<()> {
        if self.format == OutputFormat::Text {
            println!("{url}");
        }
        Ok(())
    }
}
