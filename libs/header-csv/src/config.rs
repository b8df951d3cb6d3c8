use serde::Deserialize;

use crate::error::{Error, Result};
use crate::rows::parse_delimiter;

/// Dialect and header settings shared by [`Decoder`](crate::Decoder) and
/// [`Encoder`](crate::Encoder).
///
/// Every key is optional:
///
/// ```json
/// { "delimiter": "\\t", "quoting": true, "header": ["id", "name"], "crlf": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Single character; `"\t"` and the escaped `"\\t"` both mean tab.
    pub delimiter: String,
    pub quoting: bool,
    /// Explicit header. Empty means infer it from the stream.
    pub header: Vec<String>,
    /// Terminate written rows with `\r\n` instead of `\n`.
    pub crlf: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            quoting: true,
            header: Vec::new(),
            crlf: false,
        }
    }
}

impl CsvConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.delimiter_char()?;
        Ok(config)
    }

    pub fn delimiter_char(&self) -> Result<char> {
        parse_delimiter(&self.delimiter).map_err(Error::Config)
    }

    /// `None` when the header should be inferred.
    pub(crate) fn explicit_header(&self) -> Option<Vec<String>> {
        (!self.header.is_empty()).then(|| self.header.clone())
    }
}
