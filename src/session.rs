use anyhow::{Context, Result};
use std::io::{BufRead, Read, Write};
use tracing::{debug, info};

use crate::model_gateway::ModelGateway;
use crate::runner::{QueryOutcome, run_query};
use crate::selector::{self, ModelChoice};

/// Runs one menu-prompt-query cycle.
///
/// Returns `Ok(None)` when the menu choice is rejected; `connect` is not
/// called in that case, so no backend is ever contacted.
pub async fn run_session<R, W, T, G, F>(
    input: &mut R,
    out: &mut W,
    timer_out: T,
    connect: F,
) -> Result<Option<QueryOutcome>>
where
    R: BufRead,
    W: Write,
    T: Write + Send + 'static,
    G: ModelGateway,
    F: FnOnce(ModelChoice) -> G,
{
    selector::write_menu(out).context("Failed to write menu")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read menu choice")?;

    let Some(choice) = selector::parse_choice(&line) else {
        debug!(input = %line.trim(), "rejected menu choice");
        writeln!(out, "Invalid choice. Exiting...").context("Failed to write to stdout")?;
        return Ok(None);
    };

    info!(model = choice.label(), backend = choice.family().as_str(), "model selected");
    let gateway = connect(choice);
    writeln!(out, "Using the {choice}.").context("Failed to write to stdout")?;
    writeln!(
        out,
        "Enter your prompt/query (Press Ctrl+D or Ctrl+Z followed by Enter to finish):"
    )
    .context("Failed to write to stdout")?;
    out.flush().context("Failed to flush stdout")?;

    let mut prompt = String::new();
    input
        .read_to_string(&mut prompt)
        .context("Failed to read prompt")?;

    writeln!(out, "This is the user input that has been read in")
        .context("Failed to write to stdout")?;
    writeln!(out, "{prompt}").context("Failed to write to stdout")?;

    let outcome = run_query(&gateway, &prompt, out, timer_out).await?;
    Ok(Some(outcome))
}
