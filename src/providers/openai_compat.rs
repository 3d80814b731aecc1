use std::time::Duration;
use log::{debug, trace, error};

use crate::request::{ChatRequestBody, CompletionResponse, CompletionRequest};

/// Client for one provider speaking the OpenAI chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient
{   provider: crate::Provider
  , api_base: String
  , api_key: Option<String>
  , http_client: reqwest::Client
}

impl OpenAiCompatClient
{   pub fn new(
      provider: crate::Provider
    , config: &crate::config::ProviderConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating client for {}", provider);
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   debug!("{} timeout: {}s", provider, secs);
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })?;

        let api_base = config.api_base
          .clone()
          .unwrap_or_else(|| provider.default_api_base().to_string())
          .trim_end_matches('/')
          .to_string();

        Ok(OpenAiCompatClient
        {   provider
          , api_base
          , api_key: config.resolve_api_key()
          , http_client
        })
    }

    pub fn provider(&self) -> crate::Provider
    {   self.provider
    }

    pub fn api_base(&self) -> &str
    {   &self.api_base
    }

    fn get_api_key(&self)
      -> Result<Option<&str>, crate::error::Error>
    {   match (&self.api_key, self.provider.requires_api_key())
        {   (Some(key), _) => Ok(Some(key.as_str()))
          , (None, false) => Ok(None)
          , (None, true) => {
              error!("No API key for provider: {}", self.provider);
              Err(crate::error::Error::MissingApiKey(
                self.provider.key().to_string()
              ))
            }
        }
    }

    /// POST one chat completion; `model` is the provider-local name
    pub async fn send_chat(
      &self
    , model: &str
    , request: &CompletionRequest
    ) -> Result<CompletionResponse, crate::error::Error>
    {   debug!("Sending chat completion to {} for: {}", self.provider, model);

        let body = ChatRequestBody
        {   model
          , messages: &request.messages
          , temperature: request.temperature
          , stream: false
        };

        trace!("{} request: {:?}", self.provider, body);

        let mut http_request = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Content-Type", "application/json")
          .json(&body);
        if let Some(key) = self.get_api_key()?
        {   http_request = http_request
              .header("Authorization", format!("Bearer {}", key));
        }

        let response = http_request
          .send()
          .await
          .map_err(map_transport_error)?;

        let status = response.status();
        trace!("{} response status: {}", self.provider, status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            debug!("{} API error: {}", self.provider, error_text);
            return Err(crate::error::Error::ApiError(format!(
              "{} returned {}: {}",
              self.provider,
              status,
              crate::error::single_line(&error_text)
            )));
        }

        response.json::<CompletionResponse>().await.map_err(|e| {
          if e.is_timeout()
          {   crate::error::Error::Timeout
          } else
          {   debug!("Parse error: {}", e);
              crate::error::Error::ParseError(e.to_string())
          }
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> crate::error::Error
{   if e.is_timeout()
    {   debug!("Request timed out: {}", e);
        crate::error::Error::Timeout
    } else
    {   debug!("HTTP error: {}", e);
        crate::error::Error::HttpError(e.to_string())
    }
}
