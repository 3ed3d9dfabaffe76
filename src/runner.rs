use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::model::Message;
use crate::model_gateway::{ModelGateway, ModelGatewayRequest};
use crate::timer::ProgressTimer;

pub const SYSTEM_PREAMBLE: &str = "You are a helpful assistant.";

/// Result of a single query. Both variants are reached only after the
/// progress timer has been stopped and joined.
#[derive(Debug)]
pub enum QueryOutcome {
    Success { content: String, elapsed: Duration },
    Failed { error: anyhow::Error, elapsed: Duration },
}

impl QueryOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failed { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

pub fn conversation(prompt: &str) -> Vec<Message> {
    vec![Message::system(SYSTEM_PREAMBLE), Message::user(prompt)]
}

/// Sends the prompt while the progress timer runs on `timer_out`.
///
/// Backend errors come back as [`QueryOutcome::Failed`]. A timer that cannot
/// write is logged and otherwise ignored.
pub async fn submit<G, T>(gateway: &G, prompt: &str, timer_out: T) -> QueryOutcome
where
    G: ModelGateway + ?Sized,
    T: Write + Send + 'static,
{
    let request = ModelGatewayRequest {
        messages: conversation(prompt),
    };

    let started = Instant::now();
    let timer = ProgressTimer::start(timer_out);
    let result = gateway.chat(request).await;
    let elapsed = match timer.stop().await {
        Ok(elapsed) => elapsed,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "progress timer failed");
            started.elapsed()
        }
    };

    // Stderr shares the terminal with the progress line; keep these at debug.
    match result {
        Ok(response) => {
            debug!(
                backend = gateway.name(),
                elapsed = ?elapsed,
                response_len = response.content.len(),
                "model query completed"
            );
            QueryOutcome::Success {
                content: response.content,
                elapsed,
            }
        }
        Err(error) => {
            debug!(
                backend = gateway.name(),
                elapsed = ?elapsed,
                error = %format!("{error:#}"),
                "model query failed"
            );
            QueryOutcome::Failed { error, elapsed }
        }
    }
}

pub fn present(outcome: &QueryOutcome, backend: &str, out: &mut impl Write) -> Result<()> {
    // Step off the line the timer was rewriting.
    writeln!(out).context("Failed to write to stdout")?;
    match outcome {
        QueryOutcome::Success { content, .. } => {
            writeln!(out, "Model Response:").context("Failed to write to stdout")?;
            writeln!(out, "{content}").context("Failed to write to stdout")?;
        }
        QueryOutcome::Failed { error, .. } => {
            writeln!(out, "Error querying the {backend} model: {error:#}")
                .context("Failed to write to stdout")?;
        }
    }
    out.flush().context("Failed to flush stdout")
}

pub async fn run_query<G, W, T>(
    gateway: &G,
    prompt: &str,
    out: &mut W,
    timer_out: T,
) -> Result<QueryOutcome>
where
    G: ModelGateway + ?Sized,
    W: Write,
    T: Write + Send + 'static,
{
    writeln!(
        out,
        "Query sent to {} LLM. Waiting for response...",
        gateway.name()
    )
    .context("Failed to write to stdout")?;
    out.flush().context("Failed to flush stdout")?;

    let outcome = submit(gateway, prompt, timer_out).await;
    present(&outcome, gateway.name(), out)?;
    Ok(outcome)
}


#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::test_support::StubGateway;
    use super::{QueryOutcome, SYSTEM_PREAMBLE, conversation, present, run_query, submit};
    use crate::model::{Message, MessageRole};
    use crate::timer::test_support::SharedBuffer;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn conversation_is_preamble_then_verbatim_prompt() {
        let messages = conversation("line one\nline two\n");
        assert_eq!(
            messages,
            vec![
                Message::system(SYSTEM_PREAMBLE),
                Message::user("line one\nline two\n"),
            ]
        );
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "You are a helpful assistant.");
    }

    #[tokio::test(start_paused = true)]
    async fn success_prints_banner_and_response_after_timer() {
        let gateway = StubGateway::ok("Hello world");
        let out = SharedBuffer::default();

        let outcome = run_query(&gateway, "hi", &mut out.clone(), out.clone())
            .await
            .expect("query should run");

        assert!(outcome.is_success());
        let text = out.contents();
        assert!(
            text.contains("\nModel Response:\nHello world\n"),
            "output: {text:?}"
        );
        let banner = text.find("Model Response:").expect("banner present");
        let last_tick = text.rfind("\rProcessing Time:").expect("timer rendered");
        assert!(last_tick < banner, "timer wrote after response: {text:?}");
        assert!(text.starts_with("Query sent to Stub LLM. Waiting for response...\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_prints_error_line_and_returns_outcome() {
        let gateway = StubGateway::err("rate limited");
        let out = SharedBuffer::default();

        let outcome = run_query(&gateway, "hi", &mut out.clone(), out.clone())
            .await
            .expect("backend failure should not be an Err");

        match &outcome {
            QueryOutcome::Failed { error, .. } => {
                assert!(error.to_string().contains("rate limited"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let text = out.contents();
        let error_line = text
            .lines()
            .find(|line| line.contains("Error querying"))
            .expect("error line present");
        assert_eq!(error_line, "Error querying the Stub model: rate limited");
        assert!(text.rfind('\r') < text.find("Error querying"));
        assert!(!text.contains("Model Response:"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_query_sends_one_request_with_verbatim_prompt() {
        let gateway = StubGateway::ok("ok");
        let out = SharedBuffer::default();

        run_query(&gateway, "line one\nline two\n", &mut out.clone(), out.clone())
            .await
            .expect("query should run");

        let calls = gateway.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], super::conversation("line one\nline two\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_reports_time_spent_waiting() {
        let gateway = StubGateway::ok("ok");
        let out = SharedBuffer::default();

        let outcome = run_query(&gateway, "hi", &mut out.clone(), out.clone())
            .await
            .expect("query should run");
        assert!(outcome.elapsed() >= std::time::Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn broken_timer_output_keeps_the_backend_result() {
        let gateway = StubGateway::ok("Hello world");

        let outcome = submit(&gateway, "hi", BrokenPipe).await;

        match outcome {
            QueryOutcome::Success { content, elapsed } => {
                assert_eq!(content, "Hello world");
                assert!(elapsed >= std::time::Duration::from_millis(250));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(gateway.calls.borrow().len(), 1);
    }

    #[test]
    fn present_starts_on_a_fresh_line() {
        let mut out = Vec::new();
        let outcome = QueryOutcome::Success {
            content: "done".to_string(),
            elapsed: std::time::Duration::ZERO,
        };
        present(&outcome, "Azure", &mut out).expect("present should write");
        assert_eq!(String::from_utf8(out).expect("utf-8"), "\nModel Response:\ndone\n");
    }
}
