//! Chat completion request and response types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "system".to_string()
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.into()
        }
    }
}

/// One completion call; `model` is the full `provider:model` id
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f64
}

impl CompletionRequest
{   /// System message first, then the user message
    pub fn from_prompts(
      model: &str
    , temperature: f64
    , system_text: &str
    , user_text: &str
    ) -> Self
    {   CompletionRequest
        {   model: model.to_string()
          , messages: vec![
              ChatMessage::system(system_text)
            , ChatMessage::user(user_text)
            ]
          , temperature
        }
    }
}

/// Request body as sent to the provider
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequestBody<'a>
{   pub model: &'a str
  , pub messages: &'a [ChatMessage]
  , pub temperature: f64
  , pub stream: bool
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

impl CompletionResponse
{   /// Response with a single assistant choice
    pub fn from_text(text: impl Into<String>) -> Self
    {   CompletionResponse
        {   choices: vec![Choice
            {   message: ChoiceMessage
                {   role: Some("assistant".to_string())
                  , content: Some(text.into())
                }
              , finish_reason: Some("stop".to_string())
            }]
        }
    }

    /// Content of the first choice
    pub fn first_content(&self) -> Result<&str, crate::error::Error>
    {   let choice = self.choices
          .first()
          .ok_or(crate::error::Error::NoChoicesInResponse)?;
        choice.message.content
          .as_deref()
          .ok_or_else(|| crate::error::Error::ParseError(
            "first choice has no message content".to_string()
          ))
    }
}
