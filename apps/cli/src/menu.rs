//! Interactive numbered menu.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use color_eyre::eyre::Result;
use contentagent_core::{ContentAgent, ProgressReporter, calendar_entries};
use contentagent_gateway::Gateway;
use tracing::debug;

use crate::render::{self, Summary};

const MENU: &str = "
=== Content Strategy & Creation Pipeline ===
1. Analyze Topic & Market
2. Generate Content Plan
3. Create Content
4. Optimize Performance
5. Exit

Enter your choice (1-5):";

/// Run the menu until the operator picks Exit or input ends.
pub(crate) async fn run<G, R, W>(
    agent: &ContentAgent<G>,
    input: &mut R,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<()>
where
    G: Gateway,
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(out, "{MENU}")?;
        out.flush()?;

        let Some(choice) = read_line(input)? else {
            writeln!(out, "\nExiting.")?;
            break;
        };
        let choice = choice.trim_end_matches('.').trim();
        debug!(choice, "menu selection");

        let finished = match choice {
            "1" => analyze(agent, input, out, progress).await?,
            "2" => {
                writeln!(out, "\nGenerating content plan... (this may take a moment)")?;
                let env = agent.generate_content_plan(progress).await;
                render::envelope(out, Summary::Plan, &env)?;
                true
            }
            "3" => create(agent, input, out, progress).await?,
            "4" => optimize(agent, input, out, progress).await?,
            "5" => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            _ => {
                writeln!(out, "\nInvalid choice! Please try again.")?;
                true
            }
        };

        if !finished {
            writeln!(out, "\nExiting.")?;
            break;
        }
    }

    out.flush()?;
    Ok(())
}

/// Returns `false` when input ended mid-dialog.
async fn analyze<G: Gateway, R: BufRead, W: Write>(
    agent: &ContentAgent<G>,
    input: &mut R,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<bool> {
    let Some(topic) = ask(input, out, "Enter your topic (e.g., 'AI Development', 'Digital Marketing'):")? else {
        return Ok(false);
    };
    let Some(industry) = ask(input, out, "Enter your industry (e.g., 'Technology', 'Healthcare'):")? else {
        return Ok(false);
    };

    writeln!(out, "\nAnalyzing... (this may take a moment)")?;
    let env = agent.analyze_topic(&topic, &industry, progress).await;
    render::envelope(out, Summary::Analysis, &env)?;
    Ok(true)
}

async fn create<G: Gateway, R: BufRead, W: Write>(
    agent: &ContentAgent<G>,
    input: &mut R,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<bool> {
    let plan = match agent.load_plan() {
        Ok(plan) => plan,
        Err(e) => {
            writeln!(out, "\nError: {e}")?;
            return Ok(true);
        }
    };
    let entries = match calendar_entries(&plan) {
        Ok(entries) => entries,
        Err(e) => {
            writeln!(out, "\nError: {e}")?;
            return Ok(true);
        }
    };

    render::calendar_menu(out, &plan, entries)?;
    let prompt = format!(
        "Enter the number of the content piece to create (1-{}):",
        entries.len()
    );
    let Some(answer) = ask(input, out, &prompt)? else {
        return Ok(false);
    };

    match answer.trim_end_matches('.').trim().parse::<usize>() {
        Ok(selection) => {
            writeln!(out, "\nGenerating content... (this may take a moment)")?;
            let env = agent.create_content(selection, progress).await;
            render::envelope(out, Summary::Content, &env)?;
        }
        Err(_) => {
            writeln!(
                out,
                "\nPlease enter a valid number between 1 and {}.",
                entries.len()
            )?;
        }
    }
    Ok(true)
}

async fn optimize<G: Gateway, R: BufRead, W: Write>(
    agent: &ContentAgent<G>,
    input: &mut R,
    out: &mut W,
    progress: &dyn ProgressReporter,
) -> Result<bool> {
    let Some(content) = ask(input, out, "Enter the path of the published content JSON:")? else {
        return Ok(false);
    };
    let Some(metrics) = ask(input, out, "Enter the path of its performance metrics JSON:")? else {
        return Ok(false);
    };

    writeln!(out, "\nOptimizing... (this may take a moment)")?;
    let env = agent
        .optimize_files(&PathBuf::from(content), &PathBuf::from(metrics), progress)
        .await;
    render::envelope(out, Summary::Optimization, &env)?;
    Ok(true)
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<Option<String>> {
    writeln!(out, "\n{prompt}")?;
    out.flush()?;
    read_line(input)
}

/// Next trimmed line, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
