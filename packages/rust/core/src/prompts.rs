//! Prompt builders, one per task.
//!
//! Each builder returns an immutable [`PromptSpec`] carrying the instruction,
//! the caller's inputs, a literal JSON skeleton, and the [`ShapeDescription`]
//! the response is validated against.

use contentagent_shared::{FieldSpec, PromptInput, PromptSpec, ShapeDescription};
use serde_json::Value;

/// Debug-artifact and log name of each task.
pub mod task {
    pub const ANALYZE_TOPIC: &str = "analyze_topic";
    pub const MONTHLY_THEMES: &str = "monthly_themes";
    pub const CONTENT_CALENDAR: &str = "content_calendar";
    pub const CONTENT_PLAN: &str = "content_plan";
    pub const CREATE_CONTENT: &str = "create_content";
    pub const OPTIMIZE_PERFORMANCE: &str = "optimize_performance";
}

/// Number of monthly themes (and calendar batches) in a plan.
pub const THEME_COUNT: usize = 3;

/// Weeks generated per calendar batch.
pub const WEEKS_PER_BATCH: usize = 4;

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

pub fn analysis_shape() -> ShapeDescription {
    ShapeDescription::object(vec![
        FieldSpec::nested(
            "market_research",
            &["target_audience", "consumption_patterns", "competitor_analysis", "seo_opportunities"],
        ),
        FieldSpec::nested(
            "content_gaps",
            &["subtopics", "formats", "pain_points", "unique_angles"],
        ),
        FieldSpec::nested(
            "trending_aspects",
            &["industry_trends", "search_terms", "social_media", "seasonal_relevance"],
        ),
        FieldSpec::nested(
            "content_opportunities",
            &["content_types", "platforms", "collaborations", "monetization"],
        ),
    ])
}

pub fn themes_shape() -> ShapeDescription {
    ShapeDescription::list(
        Some(THEME_COUNT),
        vec![
            FieldSpec::new("month"),
            FieldSpec::new("theme"),
            FieldSpec::new("focus_areas"),
        ],
    )
}

pub fn calendar_shape() -> ShapeDescription {
    ShapeDescription::list(
        Some(WEEKS_PER_BATCH),
        vec![
            FieldSpec::new("week"),
            FieldSpec::nested(
                "main_content",
                &["type", "title", "description", "target_keywords", "estimated_word_count"],
            ),
            FieldSpec::new("supporting_content"),
        ],
    )
}

pub fn content_shape() -> ShapeDescription {
    ShapeDescription::object(vec![
        FieldSpec::nested(
            "main_content",
            &["title", "meta_description", "introduction", "sections", "conclusion", "word_count"],
        ),
        FieldSpec::nested(
            "seo_elements",
            &["primary_keyword", "secondary_keywords", "internal_links", "meta_title", "url_slug"],
        ),
        FieldSpec::nested(
            "supporting_content",
            &["social_media", "newsletter_snippet", "pull_quotes", "image_suggestions"],
        ),
        FieldSpec::nested(
            "engagement",
            &["questions", "cta_primary", "cta_secondary", "share_triggers"],
        ),
    ])
}

pub fn optimization_shape() -> ShapeDescription {
    ShapeDescription::object(vec![
        FieldSpec::nested(
            "content_improvements",
            &["engagement_bottlenecks", "missing_elements", "format_optimization", "value_proposition"],
        ),
        FieldSpec::nested(
            "distribution_adjustments",
            &["platform_performance", "timing", "audience_targeting", "promotion_strategies"],
        ),
        FieldSpec::nested(
            "seo_enhancements",
            &["keyword_opportunities", "technical_improvements", "content_gaps", "link_building"],
        ),
        FieldSpec::nested(
            "conversion_optimization",
            &["cta_performance", "journey_friction", "trust_elements", "social_proof"],
        ),
    ])
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

const ANALYSIS_TEMPLATE: &str = r#"{
  "market_research": {
    "target_audience": ["item1", "item2"],
    "consumption_patterns": ["item1", "item2"],
    "competitor_analysis": ["item1", "item2"],
    "seo_opportunities": ["item1", "item2"]
  },
  "content_gaps": {
    "subtopics": ["item1", "item2"],
    "formats": ["item1", "item2"],
    "pain_points": ["item1", "item2"],
    "unique_angles": ["item1", "item2"]
  },
  "trending_aspects": {
    "industry_trends": ["item1", "item2"],
    "search_terms": ["item1", "item2"],
    "social_media": ["item1", "item2"],
    "seasonal_relevance": ["item1", "item2"]
  },
  "content_opportunities": {
    "content_types": ["item1", "item2"],
    "platforms": ["item1", "item2"],
    "collaborations": ["item1", "item2"],
    "monetization": ["item1", "item2"]
  }
}"#;

/// Market and content-gap analysis for a topic within an industry.
pub fn analyze_topic(topic: &str, industry: &str) -> PromptSpec {
    PromptSpec::new(
        task::ANALYZE_TOPIC,
        "As a content strategy expert, analyze this topic and industry. Cover market \
         research (audience segments, consumption patterns, competitor content, SEO \
         opportunities), content gaps (underserved subtopics, missing formats, audience \
         pain points, unique angles), trending aspects (industry trends, rising search \
         terms, social media conversations, seasonal relevance) and content \
         opportunities (high-value content types, platforms, collaborations, monetization).",
        analysis_shape(),
    )
    .with_input(PromptInput::Text(format!(
        "Topic: {}\nIndustry: {}",
        topic.trim(),
        industry.trim()
    )))
    .with_template(ANALYSIS_TEMPLATE)
    .with_rules(&[
        "Replace every item1, item2 with real analysis points",
        "Each array holds 2-4 detailed points",
        "Return only valid JSON without markdown formatting or code blocks",
    ])
}

const THEMES_TEMPLATE: &str = r#"[
  {
    "month": "Month 1",
    "theme": "Brief theme name",
    "focus_areas": ["2-3 key areas"]
  }
]"#;

/// Three monthly themes derived from a saved analysis.
pub fn monthly_themes(analysis: &Value) -> PromptSpec {
    PromptSpec::new(
        task::MONTHLY_THEMES,
        "Create 3 monthly themes for a content plan built on this analysis.",
        themes_shape(),
    )
    .with_input(PromptInput::Structured {
        label: "Analysis".into(),
        value: analysis.clone(),
    })
    .with_template(THEMES_TEMPLATE)
    .with_rules(&[
        "Return exactly 3 themes",
        "Keep all text under 50 characters",
        "Include 2-3 focus areas per theme",
        "Return only the JSON array",
    ])
}

const CALENDAR_TEMPLATE: &str = r#"[
  {
    "week": "Week 1",
    "main_content": {
      "type": "Blog/Video/Guide/Case Study",
      "title": "Engaging title",
      "description": "Value proposition",
      "target_keywords": ["2-3 relevant terms"],
      "estimated_word_count": 1500
    },
    "supporting_content": [
      {
        "platform": "Instagram/LinkedIn/Twitter",
        "content_type": "Post/Video/Story",
        "description": "Platform-specific hook"
      }
    ]
  }
]"#;

/// Four calendar weeks supporting one monthly theme.
pub fn calendar_batch(theme: &Value) -> PromptSpec {
    let name = theme
        .get("theme")
        .and_then(Value::as_str)
        .unwrap_or("the monthly theme");

    let alignment = format!("Ensure all content supports the monthly theme: {name}");

    PromptSpec::new(
        task::CONTENT_CALENDAR,
        "Create a 4-week content calendar that aligns with this monthly theme.",
        calendar_shape(),
    )
    .with_input(PromptInput::Structured {
        label: "Theme".into(),
        value: theme.clone(),
    })
    .with_template(CALENDAR_TEMPLATE)
    .with_rules(&[
        "Return exactly 4 weeks of content",
        "Keep text under 30 characters but make it compelling",
        alignment.as_str(),
        "Vary content types and platforms strategically",
        "Give estimated_word_count as a whole number",
        "Return only the JSON array",
    ])
}

const CONTENT_TEMPLATE: &str = r#"{
  "main_content": {
    "title": "Your engaging title",
    "meta_description": "Your 150-160 char summary",
    "introduction": "Your introduction paragraph",
    "sections": [
      {"heading": "First subheading", "content": "First section content"}
    ],
    "conclusion": "Your conclusion paragraph",
    "word_count": 1500
  },
  "seo_elements": {
    "primary_keyword": "Main target phrase",
    "secondary_keywords": ["2-3 related terms"],
    "internal_links": ["2-3 relevant topics"],
    "meta_title": "SEO title",
    "url_slug": "url-friendly-slug"
  },
  "supporting_content": {
    "social_media": [
      {"platform": "Platform name", "type": "Post type", "content": "Post content"}
    ],
    "newsletter_snippet": "Email preview text",
    "pull_quotes": ["2-3 quotable excerpts"],
    "image_suggestions": ["2-3 image descriptions"]
  },
  "engagement": {
    "questions": ["2-3 discussion starters"],
    "cta_primary": "Main call to action",
    "cta_secondary": "Secondary call to action",
    "share_triggers": ["2-3 shareable moments"]
  }
}"#;

/// A full content package for one calendar entry.
pub fn create_content(brief: &Value) -> PromptSpec {
    PromptSpec::new(
        task::CREATE_CONTENT,
        "Create high-quality content based on this content brief, as a complete package \
         of article, SEO elements, supporting posts and engagement hooks.",
        content_shape(),
    )
    .with_input(PromptInput::Structured {
        label: "Content brief".into(),
        value: brief.clone(),
    })
    .with_template(CONTENT_TEMPLATE)
    .with_rules(&[
        "Use plain double quotes for all strings",
        "Do not use special characters in keys",
        "Separate sentences with periods rather than commas",
        "Format arrays with proper commas",
        "Return only the JSON object, no additional text",
    ])
}

const OPTIMIZATION_TEMPLATE: &str = r#"{
  "content_improvements": {
    "engagement_bottlenecks": ["item1"],
    "missing_elements": ["item1"],
    "format_optimization": ["item1"],
    "value_proposition": ["item1"]
  },
  "distribution_adjustments": {
    "platform_performance": ["item1"],
    "timing": ["item1"],
    "audience_targeting": ["item1"],
    "promotion_strategies": ["item1"]
  },
  "seo_enhancements": {
    "keyword_opportunities": ["item1"],
    "technical_improvements": ["item1"],
    "content_gaps": ["item1"],
    "link_building": ["item1"]
  },
  "conversion_optimization": {
    "cta_performance": ["item1"],
    "journey_friction": ["item1"],
    "trust_elements": ["item1"],
    "social_proof": ["item1"]
  }
}"#;

/// Improvement recommendations for published content and its metrics.
pub fn optimize_performance(content: &Value, metrics: &Value) -> PromptSpec {
    PromptSpec::new(
        task::OPTIMIZE_PERFORMANCE,
        "Based on this content and its performance metrics, provide actionable \
         optimization recommendations for the content itself, its distribution, its SEO \
         and its conversion funnel.",
        optimization_shape(),
    )
    .with_input(PromptInput::Structured {
        label: "Content".into(),
        value: content.clone(),
    })
    .with_input(PromptInput::Structured {
        label: "Metrics".into(),
        value: metrics.clone(),
    })
    .with_template(OPTIMIZATION_TEMPLATE)
    .with_rules(&[
        "Replace every item1 with a concrete, actionable recommendation",
        "Ground each recommendation in the metrics where possible",
        "Return only the JSON object",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentagent_shared::PayloadKind;
    use serde_json::json;

    #[test]
    fn analysis_prompt_embeds_topic_and_template() {
        let spec = analyze_topic("  time tracking ", "freelancing");
        let prompt = spec.render();

        assert_eq!(spec.task(), task::ANALYZE_TOPIC);
        assert!(prompt.contains("Topic: time tracking\nIndustry: freelancing"));
        assert!(prompt.contains("\"seo_opportunities\""));
        assert!(prompt.contains("Required top-level keys: market_research"));
    }

    #[test]
    fn templates_match_their_shapes() {
        let cases = [
            (ANALYSIS_TEMPLATE, analysis_shape()),
            (THEMES_TEMPLATE, themes_shape()),
            (CALENDAR_TEMPLATE, calendar_shape()),
            (CONTENT_TEMPLATE, content_shape()),
            (OPTIMIZATION_TEMPLATE, optimization_shape()),
        ];

        for (template, shape) in cases {
            let value: Value = serde_json::from_str(template).expect("template is valid JSON");
            let sample = match shape.kind {
                PayloadKind::Object => value,
                PayloadKind::List { .. } => value[0].clone(),
            };
            for name in shape.required_names() {
                assert!(sample.get(name).is_some(), "template lacks {name}");
            }
            for field in &shape.fields {
                for child in &field.children {
                    assert!(
                        sample[&field.name].get(&child.name).is_some(),
                        "template lacks {}.{}",
                        field.name,
                        child.name
                    );
                }
            }
        }
    }

    #[test]
    fn plan_shapes_fix_list_lengths() {
        assert_eq!(
            themes_shape().kind,
            PayloadKind::List {
                exact_len: Some(THEME_COUNT)
            }
        );
        assert_eq!(
            calendar_shape().kind,
            PayloadKind::List {
                exact_len: Some(WEEKS_PER_BATCH)
            }
        );
    }

    #[test]
    fn calendar_prompt_names_the_theme() {
        let theme = json!({"month": "Month 2", "theme": "Invoicing basics", "focus_areas": []});
        let prompt = calendar_batch(&theme).render();
        assert!(prompt.contains("supports the monthly theme: Invoicing basics"));
        assert!(prompt.contains("\"Invoicing basics\""));
        assert!(prompt.contains("Return exactly 4 elements."));
    }

    #[test]
    fn optimization_prompt_carries_both_inputs() {
        let spec = optimize_performance(&json!({"title": "T"}), &json!({"views": 10}));
        assert_eq!(spec.inputs().len(), 2);
        let prompt = spec.render();
        assert!(prompt.contains("Content:\n"));
        assert!(prompt.contains("Metrics:\n"));
    }
}
