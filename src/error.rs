use std::fmt;

/// Custom error type for prompt-runner operations
/// Implements Clone so results can be recorded and compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Model identifier is not of the form `provider:model`
    InvalidModel(String)
  , /// Provider prefix is not one we know how to reach
    UnknownProvider(String)
  , /// API key is missing for a provider
    MissingApiKey(String)
  , /// HTTP request error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Malformed command line value
    InvalidArgument(String)
  , /// Filesystem error while reading prompts or writing results
    Io(String)
  , /// Timeout error
    Timeout
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidModel(model) => {
              write!(f,
                "Invalid model format, expected provider:model, got: {}",
                model
              )
            }
          , Error::UnknownProvider(provider) => {
              write!(f, "Unknown provider: {}", provider)
            }
          , Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::InvalidArgument(msg) => {
              write!(f, "Invalid argument: {}", msg)
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Other(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Collapse every run of whitespace, newlines included, to one space
pub fn single_line(text: &str) -> String
{   text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
