use std::path::PathBuf;

use clap::Parser;

pub const USAGE: &str = "Usage: prompt-runner <system_prompt_file> \
<user_prompt_file> <output_log_dir> <num_calls> <model> <temperature>";

// Numbers stay as text until `into_settings` so malformed values
// surface as Error::InvalidArgument rather than a clap error.
#[derive(Debug, Parser)]
#[command(name = "prompt-runner")]
#[command(about = "Send one prompt pair to an LLM N times and save each answer", version)]
pub struct Cli
{   /// File holding the system prompt
    pub system_prompt_file: PathBuf
  , /// File holding the user prompt
    pub user_prompt_file: PathBuf
  , /// Directory receiving one .tf file per answer
    pub output_log_dir: PathBuf
  , /// Number of completion calls
    #[arg(allow_negative_numbers = true)]
    pub num_calls: String
  , /// Model id as provider:model, e.g. ollama:llama3
    pub model: String
  , /// Sampling temperature passed through to the provider
    #[arg(allow_negative_numbers = true)]
    pub temperature: String
}

impl Cli
{   pub fn into_settings(self)
      -> Result<crate::runner::RunSettings, crate::error::Error>
    {   let num_calls = self.num_calls.trim().parse::<usize>().map_err(|_| {
          crate::error::Error::InvalidArgument(format!(
            "num_calls must be a non-negative integer, got '{}'",
            self.num_calls
          ))
        })?;
        let temperature = self.temperature.trim().parse::<f64>().map_err(|_| {
          crate::error::Error::InvalidArgument(format!(
            "temperature must be a number, got '{}'",
            self.temperature
          ))
        })?;
        if self.model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidArgument(
              "model must not be empty".to_string()
            ));
        }

        Ok(crate::runner::RunSettings
        {   system_prompt_file: self.system_prompt_file
          , user_prompt_file: self.user_prompt_file
          , output_dir: self.output_log_dir
          , num_calls
          , model: self.model
          , temperature
        })
    }
}
