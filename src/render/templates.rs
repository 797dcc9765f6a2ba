use super::escape_html;
use crate::config::Branding;
use crate::domain::model::Recipient;

/// 每個類別的顏色與標題
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub subject_emoji: &'static str,
    pub subject_text: &'static str,
    pub header_title: &'static str,
    pub header_subtitle: &'static str,
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub accent_color: &'static str,
}

/// One implementation per category; `Category::template` picks the right one.
pub trait CertificateTemplate: Send + Sync {
    fn theme(&self) -> &'static Theme;
    fn main_content(&self, branding: &Branding, recipient: &Recipient) -> String;
    fn next_steps(&self, branding: &Branding) -> Vec<String>;
}

pub struct WinnerTemplate;
pub struct ParticipantTemplate;
pub struct OrganizerTemplate;

static WINNER_THEME: Theme = Theme {
    subject_emoji: "🏆",
    subject_text: "Congratulations on Your Victory!",
    header_title: "Winner Announcement",
    header_subtitle: "Congratulations on your exceptional achievement!",
    primary_color: "#1e40af",
    secondary_color: "#0ea5e9",
    accent_color: "#f0f9ff",
};

static PARTICIPANT_THEME: Theme = Theme {
    subject_emoji: "🎉",
    subject_text: "Thank You for Participating!",
    header_title: "Participation Certificate",
    header_subtitle: "Your contribution made this event amazing!",
    primary_color: "#059669",
    secondary_color: "#10b981",
    accent_color: "#f0fdf4",
};

static ORGANIZER_THEME: Theme = Theme {
    subject_emoji: "🎉",
    subject_text: "Thank You for Organizing!",
    header_title: "Organizer Certificate",
    header_subtitle: "Appreciation for your hard work and dedication",
    primary_color: "#7c3aed",
    secondary_color: "#8b5cf6",
    accent_color: "#faf5ff",
};

const PARAGRAPH_STYLE: &str = "margin: 0 0 25px; line-height: 1.6; color: #4b5563; font-size: 16px;";

fn certificate_note(theme: &Theme, text: &str) -> String {
    format!(
        r#"<div style="background: {accent}; border-left: 5px solid {primary}; padding: 20px; border-radius: 8px; margin: 25px 0;">
  <p style="margin: 0; color: #1f2937; font-size: 16px;">📎 {text}</p>
</div>"#,
        accent = theme.accent_color,
        primary = theme.primary_color,
        text = text,
    )
}

/// 依名次決定獎牌
pub fn medal_for(rank: &str) -> &'static str {
    if rank.contains("1st") {
        "🥇"
    } else if rank.contains("2nd") {
        "🥈"
    } else {
        "🥉"
    }
}

impl CertificateTemplate for WinnerTemplate {
    fn theme(&self) -> &'static Theme {
        &WINNER_THEME
    }

    fn main_content(&self, branding: &Branding, recipient: &Recipient) -> String {
        let event = escape_html(&branding.event_name);
        let rank_section = recipient
            .rank_position
            .as_deref()
            .filter(|rank| !rank.trim().is_empty())
            .map(|rank| {
                format!(
                    r#"<div style="background: #fef3c7; padding: 25px; border-radius: 12px; margin: 25px 0; border-left: 5px solid #f59e0b; text-align: center;">
  <div style="font-size: 48px; margin-bottom: 15px;">{medal}</div>
  <h3 style="color: #92400e; margin: 0 0 10px; font-size: 24px;">Achievement Unlocked!</h3>
  <p style="color: #92400e; margin: 0; font-size: 18px; font-weight: 600;">Position: {rank}</p>
  <p style="color: #92400e; margin: 8px 0 0; font-size: 16px;">Competition: {event}</p>
</div>"#,
                    medal = medal_for(rank),
                    rank = escape_html(rank),
                    event = event,
                )
            })
            .unwrap_or_default();

        format!(
            r#"<p style="{style}">
  We are <strong>thrilled</strong> to announce that you have emerged as a <span style="color: {primary}; font-weight: bold;">winner</span> in {event}!
  Your outstanding performance demonstrated exceptional technical skills and innovative problem-solving abilities.
</p>
{rank_section}
{note}"#,
            style = PARAGRAPH_STYLE,
            primary = WINNER_THEME.primary_color,
            event = event,
            rank_section = rank_section,
            note = certificate_note(
                &WINNER_THEME,
                &format!(
                    "Your official {} winner certificate has been attached to this email. Display it with pride!",
                    event
                )
            ),
        )
    }

    fn next_steps(&self, branding: &Branding) -> Vec<String> {
        vec![
            "🏆 Download and save your winner certificate".to_string(),
            "📱 Share your achievement on LinkedIn and social media".to_string(),
            format!("🏷️ Tag @{} in your posts", branding.organization_name),
            format!("📌 Use hashtags: {} #Programming #Winner", hashtag(&branding.event_name)),
        ]
    }
}

impl CertificateTemplate for ParticipantTemplate {
    fn theme(&self) -> &'static Theme {
        &PARTICIPANT_THEME
    }

    fn main_content(&self, branding: &Branding, _recipient: &Recipient) -> String {
        let event = escape_html(&branding.event_name);
        format!(
            r#"<p style="{style}">
  Thank you for being part of {event}! Your participation and enthusiasm contributed to making this event a tremendous success.
  Every line of code you wrote and every problem you tackled brought value to our programming community.
</p>
{note}"#,
            style = PARAGRAPH_STYLE,
            event = event,
            note = certificate_note(
                &PARTICIPANT_THEME,
                &format!(
                    "Your official {} participation certificate has been attached to this email. Keep coding and keep growing!",
                    event
                )
            ),
        )
    }

    fn next_steps(&self, _branding: &Branding) -> Vec<String> {
        vec![
            "📜 Download your participation certificate".to_string(),
            "📚 Continue practicing on coding platforms".to_string(),
            "🌟 Follow us for upcoming events and workshops".to_string(),
            "📱 Share your coding journey on social media".to_string(),
        ]
    }
}

impl CertificateTemplate for OrganizerTemplate {
    fn theme(&self) -> &'static Theme {
        &ORGANIZER_THEME
    }

    fn main_content(&self, branding: &Branding, recipient: &Recipient) -> String {
        let event = escape_html(&branding.event_name);
        let stat = |key: &str| -> String {
            match recipient.event_stats.get(key) {
                Some(serde_json::Value::String(s)) => escape_html(s),
                Some(serde_json::Value::Null) | None => "N/A".to_string(),
                Some(other) => escape_html(&other.to_string()),
            }
        };
        let tile = |label: &str, value: String| {
            format!(
                r#"<td style="text-align: center; padding: 12px;"><div style="font-size: 24px; font-weight: bold; color: #6b21a8;">{value}</div><div style="font-size: 13px; color: #6b7280;">{label}</div></td>"#,
                value = value,
                label = label,
            )
        };

        format!(
            r#"<p style="{style}">
  Here's a comprehensive summary of {event}. Thank you for your dedication in making this event successful!
</p>
<table role="presentation" width="100%" style="background: {accent}; border-radius: 12px; margin: 25px 0;">
  <tr>{participants}{solved}{completion}</tr>
</table>
{note}"#,
            style = PARAGRAPH_STYLE,
            event = event,
            accent = ORGANIZER_THEME.accent_color,
            participants = tile("Participants", stat("total_participants")),
            solved = tile("Problems Solved", stat("problems_solved")),
            completion = tile("Completion Rate", stat("completion_rate")),
            note = certificate_note(
                &ORGANIZER_THEME,
                &format!(
                    "Your official {} organizer certificate has been attached to this email. Thank you for your leadership and dedication!",
                    event
                )
            ),
        )
    }

    fn next_steps(&self, _branding: &Branding) -> Vec<String> {
        vec![
            "📜 Download your organizer certificate".to_string(),
            "📧 Send follow-up communications to winners".to_string(),
            "📋 Document lessons learned for future events".to_string(),
            "🎯 Plan improvements for the next iteration".to_string(),
            "🤝 Coordinate with sponsors and partners".to_string(),
        ]
    }
}

/// "Code Feast 4.0" -> "#CodeFeast4.0"
fn hashtag(event_name: &str) -> String {
    let compact: String = event_name.split_whitespace().collect();
    format!("#{}", compact)
}
