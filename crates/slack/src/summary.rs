use chrono::{DateTime, Utc};

use peerly_core::catalog::Category;
use peerly_core::wizard::WizardState;

use crate::blocks::{MessageBuilder, MessageTemplate};

/// Builds the channel message posted once the review screen is confirmed.
/// Pure apart from the injected timestamp; delivery is the caller's job in
/// the follow-up phase. Uses the detailed rating labels, unlike the review
/// screen's compact recap.
pub fn compose_summary(state: &WizardState, submitted_at: DateTime<Utc>) -> MessageTemplate {
    let subject = state.selected_user.as_deref().unwrap_or("unknown");
    let overall = state.overall.as_ref();

    let mut builder = MessageBuilder::new(format!("Feedback submitted for <@{subject}>"))
        .header("feedback.summary.header.v1", "📝 Peer Feedback Submitted")
        .section("feedback.summary.byline.v1", |section| {
            section.mrkdwn(format!(
                "<@{}> has submitted feedback for <@{subject}>",
                state.user_id
            ));
        })
        .divider();

    for category in Category::ALL {
        let heading = match category {
            Category::Performance => "*Performance Rating*",
            Category::Collaboration => "*Collaboration & Teamwork*",
            Category::Skills => "*Skills & Growth*",
        };
        let placeholder = match category {
            Category::Skills => "_No growth areas specified_",
            Category::Performance | Category::Collaboration => "_No specific comments_",
        };
        let notes = state
            .category(category)
            .map(|feedback| feedback.comments.as_str())
            .filter(|comments| !comments.is_empty())
            .unwrap_or(placeholder)
            .to_owned();
        let label = state.rating_or_median(category).detailed_label().to_owned();

        builder = builder.section(
            format!("feedback.summary.{}.v1", category.label().to_lowercase()),
            |section| {
                section.mrkdwn(heading).mrkdwn_field(label).mrkdwn_field(notes);
            },
        );
    }

    builder = builder
        .divider()
        .section("feedback.summary.strengths.v1", |section| {
            section.mrkdwn(format!(
                "*Key Strengths:*\n{}",
                non_empty_or(overall.map(|overall| overall.strengths.as_str()), "_Not provided_"),
            ));
        })
        .section("feedback.summary.improvements.v1", |section| {
            section.mrkdwn(format!(
                "*Areas for Improvement:*\n{}",
                non_empty_or(overall.map(|overall| overall.improvements.as_str()), "Not specified"),
            ));
        });

    // The additional block is omitted outright when blank, not rendered empty.
    if let Some(additional) =
        overall.map(|overall| overall.additional.as_str()).filter(|text| !text.is_empty())
    {
        builder = builder.section("feedback.summary.additional.v1", |section| {
            section.mrkdwn(format!("*Additional Comments:*\n{additional}"));
        });
    }

    builder
        .context("feedback.summary.footer.v1", |context| {
            context.mrkdwn(format!(
                "Submitted on <!date^{}^{{date_pretty}} at {{time}}|{}>",
                submitted_at.timestamp(),
                submitted_at.format("%Y-%m-%d %H:%M UTC"),
            ));
        })
        .build()
}

fn non_empty_or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => placeholder,
    }
}
