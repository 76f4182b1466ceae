//! Section text retrieval through the portal's JSON content endpoint.
//!
//! The act page only lists section titles; the text of each section comes
//! from a separate endpoint answering `{"content": ..., "footnote": ...}`
//! with HTML fragments in both fields.

use serde::Deserialize;

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::http::Transport;
use crate::text::{assemble_content, clean_html, provision_ref};
use crate::types::{Provision, SectionRef};

/// Raw reply of the content endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SectionPayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub footnote: Option<String>,
}

impl SectionPayload {
    /// Cleaned content with the footnote appended.
    #[must_use]
    pub fn to_text(&self) -> String {
        let content = clean_html(self.content.as_deref().unwrap_or_default());
        let footnote = clean_html(self.footnote.as_deref().unwrap_or_default());
        assemble_content(&content, &footnote)
    }
}

/// Parse a content endpoint body. Malformed JSON yields an empty payload.
pub fn parse_payload(body: &str) -> SectionPayload {
    match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed section content payload");
            SectionPayload::default()
        }
    }
}

/// Fetch the text of one section.
///
/// Always returns a provision: when the request fails or the endpoint
/// has nothing, the provision is kept with empty content.
pub fn fetch_section(
    transport: &dyn Transport,
    config: &HarvestConfig,
    section: &SectionRef,
) -> Provision {
    let content = match fetch_content(transport, config, section) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(section = %section.key(), error = %e, "Section content fetch failed");
            String::new()
        }
    };

    let number = if section.section_number.is_empty() {
        &section.section_id
    } else {
        &section.section_number
    };

    Provision {
        provision_ref: provision_ref(number),
        section_number: section.section_number.clone(),
        title: section.title.clone(),
        content,
    }
}

fn fetch_content(
    transport: &dyn Transport,
    config: &HarvestConfig,
    section: &SectionRef,
) -> Result<String> {
    let url = config.section_content_url(&section.act_id, &section.section_id)?;
    let response = transport.request(&url)?;

    if !response.is_ok() || response.body.trim().is_empty() {
        tracing::debug!(
            section = %section.key(),
            status = response.status,
            "No section content"
        );
        return Ok(String::new());
    }

    Ok(parse_payload(&response.body).to_text())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::HarvesterError;
    use crate::http::Response;

    /// Answers every request with the same outcome and records the URLs.
    struct FixedTransport {
        outcome: Box<dyn Fn() -> Result<Response>>,
        urls: RefCell<Vec<String>>,
    }

    impl FixedTransport {
        fn new(outcome: impl Fn() -> Result<Response> + 'static) -> Self {
            Self {
                outcome: Box::new(outcome),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for FixedTransport {
        fn request(&self, url: &str) -> Result<Response> {
            self.urls.borrow_mut().push(url.to_string());
            (self.outcome)()
        }
    }

    fn section() -> SectionRef {
        SectionRef {
            act_id: "AC_45".to_string(),
            section_id: "1002".to_string(),
            section_number: "43A.".to_string(),
            title: "Power to do certain things".to_string(),
        }
    }

    fn config() -> HarvestConfig {
        HarvestConfig::default().with_base_url("https://portal.example")
    }

    #[test]
    fn test_parse_payload() {
        let payload = parse_payload(r#"{"content":"<p>Hello</p>","footnote":""}"#);
        assert_eq!(payload.to_text(), "Hello");

        let payload = parse_payload(r#"{"content":"A","footnote":"B"}"#);
        assert_eq!(payload.to_text(), "A\n\n[Footnote] B");
    }

    #[test]
    fn test_parse_payload_tolerates_missing_and_null_fields() {
        assert_eq!(parse_payload(r#"{"content":"A"}"#).to_text(), "A");
        assert_eq!(parse_payload(r#"{"content":null,"footnote":"B"}"#).to_text(), "");
    }

    #[test]
    fn test_parse_payload_malformed() {
        let payload = parse_payload("<html>not json</html>");
        assert_eq!(payload, SectionPayload::default());
        assert_eq!(payload.to_text(), "");
    }

    #[test]
    fn test_fetch_section_success() {
        let transport = FixedTransport::new(|| {
            Ok(Response::new(200, r#"{"content":"<p>(1) Text</p>","footnote":"<i>Ins. by Act 10</i>"}"#))
        });

        let provision = fetch_section(&transport, &config(), &section());
        assert_eq!(provision.provision_ref, "s43A");
        assert_eq!(provision.section_number, "43A.");
        assert_eq!(provision.title, "Power to do certain things");
        assert_eq!(provision.content, "(1) Text\n\n[Footnote] Ins. by Act 10");

        let urls = transport.urls.borrow();
        assert_eq!(
            urls.as_slice(),
            ["https://portal.example/SectionPageContent?actid=AC_45&sectionID=1002"]
        );
    }

    #[test]
    fn test_fetch_section_keeps_provision_on_failure() {
        let not_found = FixedTransport::new(|| Ok(Response::new(404, "missing")));
        let provision = fetch_section(&not_found, &config(), &section());
        assert_eq!(provision.content, "");
        assert_eq!(provision.provision_ref, "s43A");

        let empty = FixedTransport::new(|| Ok(Response::new(200, "  ")));
        assert_eq!(fetch_section(&empty, &config(), &section()).content, "");

        let broken = FixedTransport::new(|| {
            Err(HarvesterError::RetriesExhausted {
                attempts: 4,
                message: "refused".to_string(),
            })
        });
        let provision = fetch_section(&broken, &config(), &section());
        assert_eq!(provision.content, "");
        assert_eq!(provision.title, "Power to do certain things");
    }

    #[test]
    fn test_fetch_section_without_number_uses_section_id() {
        let transport = FixedTransport::new(|| Ok(Response::new(200, r#"{"content":"x"}"#)));
        let mut section = section();
        section.section_number = String::new();
        assert_eq!(fetch_section(&transport, &config(), &section).provision_ref, "s1002");
    }
}
