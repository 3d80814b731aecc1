use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use log::debug;

use prompt_runner::cli::{Cli, USAGE};
use prompt_runner::{Client, ClientConfig, Error, PromptRunner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("warn")
    ).init();

    let cli = match Cli::try_parse()
    {   Ok(cli) => cli
      , Err(e) => match e.kind()
        {   ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
              let _ = e.print();
              return ExitCode::SUCCESS;
            }
          , _ => {
              debug!("Argument error: {}", e);
              println!("{}", USAGE);
              return ExitCode::from(1);
            }
        }
    };

    let settings = match cli.into_settings()
    {   Ok(settings) => settings
      , Err(e) => {
          eprintln!("Error: {}", e);
          return ExitCode::from(2);
        }
    };

    match run(settings).await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(e) => {
          eprintln!("Error: {}", e);
          ExitCode::from(1)
        }
    }
}

async fn run(settings: prompt_runner::RunSettings) -> Result<(), Error>
{   let config = ClientConfig::from_env()?;
    let client = Client::new(config)?;
    let mut runner = PromptRunner::new(client);
    let summary = runner.run(&settings).await?;
    debug!("{:?}", summary);
    Ok(())
}
