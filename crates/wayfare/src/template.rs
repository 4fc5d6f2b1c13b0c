//! Placeholder templates for notification emails
//!
//! Templates are plain strings containing `{{name}}` placeholders. Rendering
//! is a single left-to-right pass: every placeholder is replaced by its value,
//! or by nothing when the key is missing or the value is empty, and the
//! substituted text is never scanned again. Values are inserted verbatim, so
//! anything that came from a visitor must go through [`escape_html`] first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

/// Ordered placeholder values for a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateData(BTreeMap<String, String>);

impl TemplateData {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set a value only when one is present
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.into(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Fill every `{{name}}` placeholder in `template` from `data`
pub fn render(template: &str, data: &TemplateData) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            // unterminated, keep the tail as-is
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        if inner.contains("{{") {
            // "{{a {{b}}": the first pair is literal text
            out.push_str("{{");
            rest = after;
            continue;
        }

        out.push_str(data.get(inner.trim()).unwrap_or_default());
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Escape the five HTML-special characters
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render `<ul>` with one `<li>` per present, non-blank field
///
/// Labels and values are escaped. Returns an empty string when no field is
/// present so the placeholder simply disappears from the email.
pub fn bullet_list<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<String>)>,
{
    let items: Vec<String> = fields
        .into_iter()
        .filter_map(|(label, value)| {
            let value = value?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            Some(format!(
                "<li><strong>{}:</strong> {}</li>",
                escape_html(label),
                escape_html(value).replace('\n', "<br>")
            ))
        })
        .collect();

    if items.is_empty() {
        String::new()
    } else {
        format!("<ul>{}</ul>", items.concat())
    }
}

/// The two notification emails an inquiry produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplateKind {
    AdminNotification,
    ClientConfirmation,
}

impl EmailTemplateKind {
    /// Document id of the override for this template
    pub fn document_id(&self) -> &'static str {
        match self {
            EmailTemplateKind::AdminNotification => "admin_notification",
            EmailTemplateKind::ClientConfirmation => "client_confirmation",
        }
    }

    /// The bundled template used when no override has been saved
    pub fn default_template(&self) -> EmailTemplate {
        let (subject, html) = match self {
            EmailTemplateKind::AdminNotification => {
                (DEFAULT_ADMIN_SUBJECT, DEFAULT_ADMIN_TEMPLATE)
            }
            EmailTemplateKind::ClientConfirmation => {
                (DEFAULT_CLIENT_SUBJECT, DEFAULT_CLIENT_TEMPLATE)
            }
        };
        EmailTemplate {
            kind: *self,
            subject: subject.to_string(),
            html: html.to_string(),
            updated_at: None,
        }
    }
}

impl fmt::Display for EmailTemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_id())
    }
}

/// An email body and subject with placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub kind: EmailTemplateKind,
    pub subject: String,
    pub html: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl EmailTemplate {
    /// Render subject and body with the same data
    pub fn render(&self, data: &TemplateData) -> RenderedEmail {
        RenderedEmail {
            subject: render(&self.subject, data),
            html: render(&self.html, data),
        }
    }
}

/// Subject and HTML body ready for the mailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

pub const DEFAULT_ADMIN_SUBJECT: &str = "New inquiry: {{service_name}}";

pub const DEFAULT_ADMIN_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; color: #1f2933;">
  <h2>New inquiry received</h2>
  <p><strong>{{customer_name}}</strong> asked about <strong>{{service_name}}</strong> ({{category}}).</p>
  <p>Preferred contact: {{channel}}</p>
  <p>Email: {{customer_email}}</p>
  {{details}}
  <p style="color: #7b8794; font-size: 12px;">Submitted {{submitted_at}} &middot; reference {{inquiry_id}}</p>
</div>"#;

pub const DEFAULT_CLIENT_SUBJECT: &str = "We received your inquiry about {{service_name}}";

pub const DEFAULT_CLIENT_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; color: #1f2933;">
  <h2>Thank you, {{customer_name}}!</h2>
  <p>Your inquiry about <strong>{{service_name}}</strong> has been received. Our team will get back to you shortly.</p>
  {{details}}
  <p>Questions in the meantime? Write to {{contact_email}} or message us on WhatsApp at {{whatsapp_number}}.</p>
  <p style="color: #7b8794; font-size: 12px;">Reference {{inquiry_id}}</p>
</div>"#;
