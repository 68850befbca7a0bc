//! Human-readable summaries of task envelopes for stdout.

use std::io::{self, Write};

use contentagent_shared::Envelope;
use serde_json::Value;

/// Weeks shown in the plan preview.
const PREVIEW_WEEKS: usize = 3;

/// Which task produced an envelope; decides the summary layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Summary {
    Analysis,
    Plan,
    Content,
    Optimization,
}

impl Summary {
    fn saved_label(&self) -> &'static str {
        match self {
            Self::Analysis => "Full analysis",
            Self::Plan => "Full content plan",
            Self::Content => "Full content",
            Self::Optimization => "Optimization report",
        }
    }

    fn success_line(&self) -> &'static str {
        match self {
            Self::Analysis => "Analysis completed successfully!",
            Self::Plan => "Content plan generated successfully!",
            Self::Content => "Content created successfully!",
            Self::Optimization => "Optimization recommendations ready!",
        }
    }
}

/// Print the summary for `envelope`, or its error.
pub(crate) fn envelope<W: Write>(out: &mut W, summary: Summary, envelope: &Envelope) -> io::Result<()> {
    match envelope {
        Envelope::Success {
            payload, artifact, ..
        } => {
            writeln!(out, "\n{}", summary.success_line())?;
            match summary {
                Summary::Analysis => {
                    writeln!(out, "\nSummary of insights:")?;
                    sections(out, payload)?;
                }
                Summary::Optimization => sections(out, payload)?,
                Summary::Plan => plan(out, payload)?,
                Summary::Content => content(out, payload)?,
            }
            if let Some(artifact) = artifact {
                writeln!(
                    out,
                    "\n{} saved to {}",
                    summary.saved_label(),
                    artifact.path.display()
                )?;
            }
        }
        Envelope::Error {
            error,
            kind,
            stage,
            diagnostics,
            ..
        } => {
            writeln!(out, "\nError ({kind} during {stage}): {error}")?;
            if let Some(diag) = diagnostics {
                writeln!(
                    out,
                    "  at line {}, column {} (response length {})",
                    diag.line, diag.column, diag.raw_len
                )?;
                writeln!(out, "  near: {}", diag.context)?;
            }
        }
    }
    Ok(())
}

/// Monthly themes plus the numbered calendar, for picking a brief.
pub(crate) fn calendar_menu<W: Write>(out: &mut W, plan: &Value, entries: &[Value]) -> io::Result<()> {
    writeln!(out, "\nMonthly Themes:")?;
    for theme in items(plan.get("monthly_themes")) {
        writeln!(out, "- {}: {}", text(theme, "month"), text(theme, "theme"))?;
    }

    writeln!(out, "\nSelect content to create:")?;
    for (i, week) in entries.iter().enumerate() {
        let main = week.get("main_content").unwrap_or(&Value::Null);
        writeln!(
            out,
            "{}. {}: {} - {}",
            i + 1,
            text(week, "week"),
            text(main, "type"),
            text(main, "title")
        )?;
    }
    Ok(())
}

/// Two-level `category → aspect → items` listing.
fn sections<W: Write>(out: &mut W, payload: &Value) -> io::Result<()> {
    let Some(categories) = payload.as_object() else {
        return writeln!(out, "{payload}");
    };

    for (category, details) in categories {
        writeln!(out, "\n{}:", title_case(category))?;
        match details.as_object() {
            Some(aspects) => {
                for (aspect, values) in aspects {
                    writeln!(out, "  {}:", title_case(aspect))?;
                    for item in items(Some(values)) {
                        writeln!(out, "    - {}", scalar(item))?;
                    }
                }
            }
            None => writeln!(out, "  {}", scalar(details))?,
        }
    }
    Ok(())
}

fn plan<W: Write>(out: &mut W, payload: &Value) -> io::Result<()> {
    writeln!(out, "\nMonthly Themes:")?;
    for theme in items(payload.get("monthly_themes")) {
        writeln!(out, "\n{}: {}", text(theme, "month"), text(theme, "theme"))?;
        writeln!(out, "Focus Areas:")?;
        for area in items(theme.get("focus_areas")) {
            writeln!(out, "  - {}", scalar(area))?;
        }
    }

    writeln!(out, "\nContent Calendar Preview:")?;
    for week in items(payload.get("content_calendar")).iter().take(PREVIEW_WEEKS) {
        let main = week.get("main_content").unwrap_or(&Value::Null);
        writeln!(out, "\n{}:", text(week, "week"))?;
        writeln!(out, "Main Content:")?;
        writeln!(out, "  Type: {}", text(main, "type"))?;
        writeln!(out, "  Title: {}", text(main, "title"))?;
        writeln!(out, "  Description: {}", text(main, "description"))?;
        let keywords: Vec<String> = items(main.get("target_keywords")).iter().map(scalar).collect();
        writeln!(out, "  Keywords: {}", keywords.join(", "))?;
        if let Some(count) = main.get("estimated_word_count").and_then(Value::as_i64) {
            writeln!(out, "  Words: {count}")?;
        }

        writeln!(out, "Supporting Content:")?;
        for support in items(week.get("supporting_content")) {
            writeln!(
                out,
                "  - {} {}: {}",
                text(support, "platform"),
                text(support, "content_type"),
                text(support, "description")
            )?;
        }
    }
    Ok(())
}

fn content<W: Write>(out: &mut W, payload: &Value) -> io::Result<()> {
    let main = payload.get("main_content").unwrap_or(&Value::Null);
    writeln!(out, "\nTitle: {}", text(main, "title"))?;
    writeln!(out, "Meta Description: {}", text(main, "meta_description"))?;
    if let Some(count) = main.get("word_count") {
        writeln!(out, "Word Count: {}", scalar(count))?;
    }

    let seo = payload.get("seo_elements").unwrap_or(&Value::Null);
    writeln!(out, "\nSEO Elements:")?;
    if seo.get("primary_keyword").is_some() {
        writeln!(out, "Primary Keyword: {}", text(seo, "primary_keyword"))?;
    }
    let secondary = items(seo.get("secondary_keywords"));
    if !secondary.is_empty() {
        writeln!(out, "Secondary Keywords:")?;
        for keyword in secondary {
            writeln!(out, "- {}", scalar(keyword))?;
        }
    }
    Ok(())
}

fn items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn text(value: &Value, key: &str) -> String {
    value.get(key).map(scalar).unwrap_or_default()
}

/// Strings without quotes, everything else as compact JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `market_research` → `Market Research`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
