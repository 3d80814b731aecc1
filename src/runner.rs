//! Prompt runner: repeated completion calls with one file per answer

use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::client::ChatCompletion;
use crate::request::CompletionRequest;

const USER_PROMPT_PREFIX: &str = "user_prompt-";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const OUTPUT_EXTENSION: &str = "tf";

/// Validated inputs of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings
{   pub system_prompt_file: PathBuf
  , pub user_prompt_file: PathBuf
  , pub output_dir: PathBuf
  , pub num_calls: usize
  , pub model: String
  , pub temperature: f64
}

/// What happened across the iterations of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary
{   pub attempted: usize
  , pub written: Vec<PathBuf>
  , pub failed: usize
  , pub empty: usize
}

/// Owns the completion client and the two output streams
pub struct PromptRunner<C>
{   client: C
  , stdout: Box<dyn Write + Send>
  , stderr: Box<dyn Write + Send>
}

impl<C: ChatCompletion> PromptRunner<C>
{   /// Runner printing to the process stdout/stderr
    pub fn new(client: C) -> Self
    {   Self::with_output(
          client,
          Box::new(std::io::stdout()),
          Box::new(std::io::stderr())
        )
    }

    pub fn with_output(
      client: C
    , stdout: Box<dyn Write + Send>
    , stderr: Box<dyn Write + Send>
    ) -> Self
    {   PromptRunner { client, stdout, stderr }
    }

    pub fn client(&self) -> &C
    {   &self.client
    }

    /// One completion call. Failures are printed as a single
    /// `Error:` line and come back as `None`.
    pub async fn ask(
      &mut self
    , model: &str
    , temperature: f64
    , system_text: &str
    , user_text: &str
    ) -> Option<String>
    {   let request = CompletionRequest::from_prompts(
          model, temperature, system_text, user_text
        );
        debug!("Asking {} at temperature {}", model, temperature);

        let result = self.client
          .create(request)
          .await
          .and_then(|response| {
            response.first_content().map(|c| c.trim().to_string())
          });

        match result
        {   Ok(text) => Some(text)
          , Err(e) => {
              let line = crate::error::single_line(&e.to_string());
              if let Err(w) = writeln!(self.stderr, "Error: {}", line)
              {   warn!("Could not report error '{}': {}", line, w);
              }
              None
            }
        }
    }

    /// The main loop. Prompt files are re-read every iteration.
    pub async fn run(
      &mut self
    , settings: &RunSettings
    ) -> Result<RunSummary, crate::error::Error>
    {   tokio::fs::create_dir_all(&settings.output_dir)
          .await
          .map_err(|e| io_error(&settings.output_dir, e))?;

        let mut summary = RunSummary::default();
        for i in 1..=settings.num_calls
        {   let system_text = read_prompt(&settings.system_prompt_file).await?;
            let user_text = read_prompt(&settings.user_prompt_file).await?;
            summary.attempted += 1;

            match self.ask(
              &settings.model,
              settings.temperature,
              &system_text,
              &user_text
            ).await
            {   Some(text) if !text.is_empty() => {
                  let path = name_output_file(
                    &settings.model,
                    settings.temperature,
                    &settings.user_prompt_file,
                    &settings.output_dir
                  );
                  tokio::fs::write(&path, text.as_bytes())
                    .await
                    .map_err(|e| io_error(&path, e))?;
                  if let Err(w) = writeln!(
                    self.stdout,
                    "Response saved to {} {}/{}",
                    path.display(), i, settings.num_calls
                  )
                  {   warn!("Could not print progress for {}: {}", path.display(), w);
                  }
                  summary.written.push(path);
                }
              , Some(_) => {
                  debug!("Empty response on call {}, nothing written", i);
                  summary.empty += 1;
                }
              , None => {
                  summary.failed += 1;
                }
            }
        }

        info!(
          "Run finished: {} written, {} failed, {} empty of {}",
          summary.written.len(), summary.failed, summary.empty,
          summary.attempted
        );
        Ok(summary)
    }
}

async fn read_prompt(path: &Path) -> Result<String, crate::error::Error>
{   tokio::fs::read_to_string(path)
      .await
      .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> crate::error::Error
{   crate::error::Error::Io(format!("{}: {}", path.display(), e))
}

/// Text after the first colon, or the whole model id
pub fn model_tag(model: &str) -> &str
{   model.split_once(':').map(|(_, tag)| tag).unwrap_or(model)
}

/// `0.7` stays `0.7`, `1` becomes `1.0`; exponents are signed and
/// at least two digits wide (`1e-05`, `1e+17`)
pub fn temperature_tag(temperature: f64) -> String
{   if temperature.is_nan()
    {   return "nan".to_string();
    }
    let shortest = format!("{:?}", temperature);
    match shortest.split_once('e')
    {   Some((mantissa, exponent)) => {
          let (sign, digits) = match exponent.strip_prefix('-')
          {   Some(digits) => ('-', digits)
            , None => ('+', exponent)
          };
          format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
      , None => shortest
    }
}

fn prompt_tag(user_prompt_path: &Path) -> String
{   let basename = user_prompt_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    match basename.strip_prefix(USER_PROMPT_PREFIX)
    {   Some(rest) => rest.to_string()
      , None => basename
    }
}

/// Output path stamped with the current local time
pub fn name_output_file(
  model: &str
, temperature: f64
, user_prompt_path: &Path
, output_dir: &Path
) -> PathBuf
{   name_output_file_at(
      model,
      temperature,
      user_prompt_path,
      output_dir,
      chrono::Local::now().naive_local()
    )
}

pub fn name_output_file_at(
  model: &str
, temperature: f64
, user_prompt_path: &Path
, output_dir: &Path
, timestamp: NaiveDateTime
) -> PathBuf
{   let name = format!(
      "{}_{}_{}_{}.{}",
      model_tag(model),
      temperature_tag(temperature),
      prompt_tag(user_prompt_path),
      timestamp.format(TIMESTAMP_FORMAT),
      OUTPUT_EXTENSION
    );
    output_dir.join(name)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::request::CompletionResponse;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf
    {   fn text(&self) -> String
        {   String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf
    {   fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>
        {   self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()>
        {   Ok(())
        }
    }

    struct Scripted
    {   replies: Mutex<VecDeque<Result<CompletionResponse, crate::error::Error>>>
      , seen: Mutex<Vec<CompletionRequest>>
    }

    impl Scripted
    {   fn new(replies: Vec<Result<CompletionResponse, crate::error::Error>>) -> Self
        {   Scripted
            {   replies: Mutex::new(replies.into())
              , seen: Mutex::new(vec![])
            }
        }
    }

    #[async_trait]
    impl ChatCompletion for Scripted
    {   async fn create(
          &self
        , request: CompletionRequest
        ) -> Result<CompletionResponse, crate::error::Error>
        {   self.seen.lock().unwrap().push(request);
            self.replies
              .lock()
              .unwrap()
              .pop_front()
              .unwrap_or(Err(crate::error::Error::Other("no reply".into())))
        }
    }

    fn runner(
      replies: Vec<Result<CompletionResponse, crate::error::Error>>
    ) -> (PromptRunner<Scripted>, SharedBuf, SharedBuf)
    {   let out = SharedBuf::default();
        let err = SharedBuf::default();
        let runner = PromptRunner::with_output(
          Scripted::new(replies),
          Box::new(out.clone()),
          Box::new(err.clone())
        );
        (runner, out, err)
    }

    fn noon() -> NaiveDateTime
    {   NaiveDate::from_ymd_opt(2024, 3, 9)
          .unwrap()
          .and_hms_opt(14, 5, 7)
          .unwrap()
    }

    #[test]
    fn builds_expected_filename()
    {   let path = name_output_file_at(
          "ollama:llama3",
          0.7,
          Path::new("prompts/user_prompt-vpc.txt"),
          Path::new("out"),
          noon()
        );
        assert_eq!(
          path,
          Path::new("out").join("llama3_0.7_vpc.txt_2024-03-09_14-05-07.tf")
        );
    }

    #[test]
    fn model_without_colon_is_used_whole()
    {   assert_eq!(model_tag("gpt-4"), "gpt-4");
        assert_eq!(model_tag("ollama:llama3"), "llama3");
        assert_eq!(model_tag("ollama:llama3:8b"), "llama3:8b");
    }

    #[test]
    fn prefix_is_only_stripped_at_start()
    {   assert_eq!(prompt_tag(Path::new("/a/user_prompt-foo.txt")), "foo.txt");
        assert_eq!(
          prompt_tag(Path::new("/a/my_user_prompt-foo.txt")),
          "my_user_prompt-foo.txt"
        );
        assert_eq!(prompt_tag(Path::new("plain.txt")), "plain.txt");
    }

    #[test]
    fn integral_temperature_keeps_decimal()
    {   assert_eq!(temperature_tag(1.0), "1.0");
        assert_eq!(temperature_tag(0.25), "0.25");
        assert_eq!(temperature_tag(0.0), "0.0");
        assert_eq!(temperature_tag(-0.5), "-0.5");
    }

    #[test]
    fn exponent_temperatures_use_signed_two_digit_exponent()
    {   assert_eq!(temperature_tag(1e-5), "1e-05");
        assert_eq!(temperature_tag(1.5e-7), "1.5e-07");
        assert_eq!(temperature_tag(1e17), "1e+17");
        assert_eq!(temperature_tag(2.5e120), "2.5e+120");
        assert_eq!(temperature_tag(f64::NAN), "nan");
        assert_eq!(temperature_tag(f64::INFINITY), "inf");
    }

    #[test]
    fn current_time_name_parses_back()
    {   let path = name_output_file(
          "xai:grok-2",
          0.5,
          Path::new("user_prompt-s3.txt"),
          Path::new("logs")
        );
        assert_eq!(path.parent(), Some(Path::new("logs")));
        let name = path.file_name().unwrap().to_str().unwrap();
        let stamp = name
          .strip_prefix("grok-2_0.5_s3.txt_")
          .and_then(|rest| rest.strip_suffix(".tf"))
          .unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn ask_trims_response()
    {   let (mut runner, _out, err) = runner(vec![
          Ok(CompletionResponse::from_text("  hello  \n"))
        ]);
        let got = runner.ask("ollama:llama3", 0.3, "sys", "usr").await;
        assert_eq!(got.as_deref(), Some("hello"));
        assert_eq!(err.text(), "");

        let seen = runner.client().seen.lock().unwrap();
        assert_eq!(seen[0].model, "ollama:llama3");
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(seen[0].messages[0].role, "system");
        assert_eq!(seen[0].messages[0].content, "sys");
        assert_eq!(seen[0].messages[1].role, "user");
        assert_eq!(seen[0].messages[1].content, "usr");
    }

    #[tokio::test]
    async fn ask_failure_prints_one_error_line()
    {   let (mut runner, out, err) = runner(vec![
          Err(crate::error::Error::Timeout)
        ]);
        let got = runner.ask("xai:grok-2", 0.3, "sys", "usr").await;
        assert_eq!(got, None);
        assert_eq!(err.text(), "Error: Request timed out\n");
        assert_eq!(out.text(), "");
    }

    struct Closed;

    impl Write for Closed
    {   fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize>
        {   Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()>
        {   Ok(())
        }
    }

    #[tokio::test]
    async fn closed_streams_do_not_stop_the_run()
    {   let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sys.txt"), "s").unwrap();
        std::fs::write(dir.path().join("user_prompt-x.txt"), "u").unwrap();

        let mut runner = PromptRunner::with_output(
          Scripted::new(vec![
            Err(crate::error::Error::Timeout)
          , Ok(CompletionResponse::from_text("kept"))
          ]),
          Box::new(Closed),
          Box::new(Closed)
        );
        let summary = runner.run(&RunSettings
        {   system_prompt_file: dir.path().join("sys.txt")
          , user_prompt_file: dir.path().join("user_prompt-x.txt")
          , output_dir: dir.path().join("out")
          , num_calls: 2
          , model: "ollama:llama3".to_string()
          , temperature: 0.1
        }).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written.len(), 1);
        assert_eq!(std::fs::read_to_string(&summary.written[0]).unwrap(), "kept");
    }

    #[tokio::test]
    async fn multi_line_error_is_printed_on_one_line()
    {   let (mut runner, _out, err) = runner(vec![
          Err(crate::error::Error::ApiError("first\n  second\n".to_string()))
        ]);
        assert_eq!(runner.ask("xai:grok-2", 0.3, "s", "u").await, None);
        assert_eq!(err.text(), "Error: API error: first second\n");
    }

    #[tokio::test]
    async fn ask_with_no_choices_is_a_failure()
    {   let (mut runner, _out, err) = runner(vec![
          Ok(CompletionResponse::default())
        ]);
        assert_eq!(runner.ask("xai:grok-2", 0.3, "s", "u").await, None);
        assert_eq!(err.text().lines().count(), 1);
    }

    #[tokio::test]
    async fn empty_answer_writes_nothing()
    {   let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sys.txt"), "s").unwrap();
        std::fs::write(dir.path().join("user_prompt-x.txt"), "u").unwrap();
        let out_dir = dir.path().join("out");

        let (mut runner, out, err) = runner(vec![
          Ok(CompletionResponse::from_text("   \n"))
        ]);
        let summary = runner.run(&RunSettings
        {   system_prompt_file: dir.path().join("sys.txt")
          , user_prompt_file: dir.path().join("user_prompt-x.txt")
          , output_dir: out_dir.clone()
          , num_calls: 1
          , model: "ollama:llama3".to_string()
          , temperature: 0.1
        }).await.unwrap();

        assert_eq!(summary.empty, 1);
        assert!(summary.written.is_empty());
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
        assert_eq!(out.text(), "");
        assert_eq!(err.text(), "");
    }

    #[tokio::test]
    async fn missing_prompt_file_is_fatal()
    {   let dir = tempfile::tempdir().unwrap();
        let (mut runner, _out, _err) = runner(vec![]);
        let result = runner.run(&RunSettings
        {   system_prompt_file: dir.path().join("absent.txt")
          , user_prompt_file: dir.path().join("absent-too.txt")
          , output_dir: dir.path().join("out")
          , num_calls: 2
          , model: "ollama:llama3".to_string()
          , temperature: 0.1
        }).await;

        assert!(matches!(result, Err(crate::error::Error::Io(_))));
        assert!(runner.client().seen.lock().unwrap().is_empty());
    }
}
