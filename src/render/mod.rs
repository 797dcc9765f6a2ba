//! HTML certificate emails.
//!
//! Rendering is pure: the output depends only on the branding captured at
//! construction, the category and the recipient.

pub mod templates;

use crate::config::Branding;
use crate::domain::model::{Category, Recipient, RetryScope};
use crate::domain::ports::{RenderedEmail, Renderer};
use templates::{CertificateTemplate, OrganizerTemplate, ParticipantTemplate, WinnerTemplate};

impl Category {
    pub fn template(&self) -> &'static dyn CertificateTemplate {
        match self {
            Category::Winner => &WinnerTemplate,
            Category::Participant => &ParticipantTemplate,
            Category::Organizer => &OrganizerTemplate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    branding: Branding,
}

impl HtmlRenderer {
    pub fn new(branding: Branding) -> Self {
        Self { branding }
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    pub fn subject(&self, category: Category) -> String {
        let theme = category.template().theme();
        format!(
            "{} - {} {}",
            self.branding.event_name, theme.subject_text, theme.subject_emoji
        )
    }

    fn document(&self, category: Category, recipient: &Recipient) -> String {
        let template = category.template();
        let theme = template.theme();
        let event = escape_html(&self.branding.event_name);
        let organization = escape_html(&self.branding.organization_name);

        let steps: String = template
            .next_steps(&self.branding)
            .iter()
            .map(|step| {
                format!(
                    r#"<p style="color: #374151; margin: 0 0 12px; font-size: 16px; line-height: 1.5;">{}</p>"#,
                    escape_html(step)
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  body, table, td, p, a {{ -webkit-text-size-adjust: 100%; -ms-text-size-adjust: 100%; }}
  @media screen and (max-width: 600px) {{ .email-container {{ width: 100% !important; }} .content {{ padding: 24px !important; }} }}
  @media (prefers-color-scheme: dark) {{ .content {{ background: #111827 !important; color: #f9fafb !important; }} }}
</style>
</head>
<body style="margin: 0; padding: 0; background: #f3f4f6; font-family: 'Segoe UI', Arial, sans-serif;">
<table role="presentation" width="100%" cellpadding="0" cellspacing="0">
<tr><td align="center" style="padding: 32px 12px;">
<table role="presentation" class="email-container" width="600" cellpadding="0" cellspacing="0" style="background: #ffffff; border-radius: 16px; overflow: hidden;">
  <tr><td style="background: linear-gradient(135deg, {primary}, {secondary}); padding: 40px 32px; text-align: center;">
    <h1 style="margin: 0; color: #ffffff; font-size: 28px;">{title}</h1>
    <p style="margin: 12px 0 0; color: #e0f2fe; font-size: 16px;">{subtitle}</p>
  </td></tr>
  <tr><td class="content" style="padding: 40px 32px;">
    <h2 style="margin: 0 0 20px; color: {primary}; font-size: 22px;">Dear {name},</h2>
    {main}
    <div style="background: {accent}; padding: 24px; border-radius: 12px; margin-top: 30px;">
      <h3 style="margin: 0 0 16px; color: {primary}; font-size: 18px;">Next Steps</h3>
      {steps}
    </div>
  </td></tr>
  <tr><td style="background: #f9fafb; padding: 24px 32px; text-align: center; color: #6b7280; font-size: 13px;">
    This email was sent by {event} Team. If you have any questions, please contact us.<br>
    &copy; {year} {organization}. All rights reserved.
  </td></tr>
</table>
</td></tr>
</table>
</body>
</html>"#,
            title = theme.header_title,
            subtitle = theme.header_subtitle,
            primary = theme.primary_color,
            secondary = theme.secondary_color,
            accent = theme.accent_color,
            name = escape_html(recipient.name.trim()),
            main = template.main_content(&self.branding, recipient),
            steps = steps,
            event = event,
            year = self.branding.year,
            organization = organization,
        )
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, category: Category, recipient: &Recipient) -> RenderedEmail {
        RenderedEmail {
            subject: self.subject(category),
            html: self.document(category, recipient),
        }
    }
}

impl RenderedEmail {
    /// Variant used for the encoding retry: the subject loses every non-ASCII
    /// character, and with `RetryScope::All` the body's non-ASCII characters
    /// become numeric character references.
    pub fn ascii_safe(&self, scope: RetryScope) -> RenderedEmail {
        let html = match scope {
            RetryScope::Subject => self.html.clone(),
            RetryScope::All => html_numeric_entities(&self.html),
        };
        RenderedEmail {
            subject: strip_non_ascii(&self.subject),
            html,
        }
    }
}

/// 移除非 ASCII 字元並壓縮多餘空白
pub fn strip_non_ascii(text: &str) -> String {
    let kept: String = text.chars().filter(|c| c.is_ascii()).collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn html_numeric_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#x{:X};", c as u32));
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
