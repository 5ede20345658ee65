use once_cell::sync::Lazy;
use regex::Regex;

use crate::probe::http::HttpFacts;
use crate::types::Technology;

struct BodySignature {
    pattern: Regex,
    name: &'static str,
    category: &'static str,
    confidence: u8,
}

fn sig(pattern: &str, name: &'static str, category: &'static str, confidence: u8) -> BodySignature {
    BodySignature {
        pattern: Regex::new(pattern).expect("static signature pattern"),
        name,
        category,
        confidence,
    }
}

/// Fixed catalog of script/CDN/analytics/CMS markers matched against the
/// response body. Weights follow how unambiguous each marker is.
static BODY_SIGNATURES: Lazy<Vec<BodySignature>> = Lazy::new(|| {
    vec![
        sig(r#"(?i)<script[^>]*src="[^"]*jquery[^"]*\.js"#, "jQuery", "javascript-library", 90),
        sig(r#"(?i)<script[^>]*src="[^"]*bootstrap[^"]*\.js"#, "Bootstrap", "css-framework", 90),
        sig(r#"(?i)<script[^>]*src="[^"]*react[^"]*\.js"#, "React", "javascript-framework", 90),
        sig(r#"(?i)<script[^>]*src="[^"]*angular[^"]*\.js"#, "Angular", "javascript-framework", 90),
        sig(r#"(?i)<script[^>]*src="[^"]*vue[^"]*\.js"#, "Vue.js", "javascript-framework", 90),
        sig(r#"(?i)wp-content|wp-includes"#, "WordPress", "cms", 95),
        sig(r#"(?i)/sites/default/files|drupal\.js"#, "Drupal", "cms", 95),
        sig(r#"(?i)/media/jui/|joomla"#, "Joomla", "cms", 90),
        sig(r#"(?i)google-analytics\.com|googletagmanager\.com/gtag"#, "Google Analytics", "analytics", 100),
        sig(r#"(?i)cdn\.cloudflare\.com|cdnjs\.cloudflare\.com"#, "Cloudflare CDN", "cdn", 95),
        sig(r#"(?i)\.cloudfront\.net"#, "Amazon CloudFront", "cdn", 95),
        sig(r#"(?i)js\.stripe\.com"#, "Stripe", "payment", 95),
        sig(r#"(?i)connect\.facebook\.net"#, "Facebook SDK", "social", 90),
    ]
});

static GENERATOR_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta\s+name="generator"\s+content="([^"]+)""#).unwrap());

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)?)").unwrap());

fn extract_version(text: &str) -> Option<String> {
    VERSION
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Header inspection plus body pattern matching. Purely local: operates on
/// the facts the HTTP stage already collected.
pub fn detect(facts: &HttpFacts) -> Vec<Technology> {
    let mut technologies = Vec::new();

    if let Some(server) = facts.headers.get("server") {
        let name = server.split('/').next().unwrap_or(server).trim();
        if !name.is_empty() {
            technologies.push(Technology {
                name: name.to_string(),
                version: extract_version(server),
                category: "web-server".to_string(),
                confidence: 100,
            });
        }
    }

    if let Some(powered_by) = facts.headers.get("x-powered-by") {
        let name = powered_by.split('/').next().unwrap_or(powered_by).trim();
        if !name.is_empty() {
            technologies.push(Technology {
                name: name.to_string(),
                version: extract_version(powered_by),
                category: "framework".to_string(),
                confidence: 90,
            });
        }
    }

    if let Some(aspnet) = facts.headers.get("x-aspnet-version") {
        technologies.push(Technology {
            name: "ASP.NET".to_string(),
            version: Some(aspnet.trim().to_string()),
            category: "framework".to_string(),
            confidence: 100,
        });
    }

    if let Some(caps) = GENERATOR_META.captures(&facts.body) {
        let content = caps[1].to_string();
        technologies.push(Technology {
            name: content
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or(&content)
                .to_string(),
            version: extract_version(&content),
            category: "cms".to_string(),
            confidence: 95,
        });
    }

    for signature in BODY_SIGNATURES.iter() {
        if let Some(m) = signature.pattern.find(&facts.body) {
            // Avoid double-reporting when the generator meta already named it.
            if technologies.iter().any(|t| t.name == signature.name) {
                continue;
            }
            technologies.push(Technology {
                name: signature.name.to_string(),
                version: extract_version(m.as_str()),
                category: signature.category.to_string(),
                confidence: signature.confidence,
            });
        }
    }

    technologies
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn facts(headers: &[(&str, &str)], body: &str) -> HttpFacts {
        HttpFacts {
            url: "https://app.example.com".into(),
            scheme: "https".into(),
            status: 200,
            title: None,
            server: None,
            content_length: Some(body.len() as u64),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: body.to_string(),
        }
    }

    #[test]
    fn server_header_yields_web_server_with_version() {
        let f = facts(&[("server", "nginx/1.24.0")], "");
        let techs = detect(&f);
        assert_eq!(techs.len(), 1);
        assert_eq!(techs[0].name, "nginx");
        assert_eq!(techs[0].version.as_deref(), Some("1.24.0"));
        assert_eq!(techs[0].category, "web-server");
        assert_eq!(techs[0].confidence, 100);
    }

    #[test]
    fn powered_by_and_aspnet_headers() {
        let f = facts(
            &[("x-powered-by", "PHP/8.2.1"), ("x-aspnet-version", "4.0.30319")],
            "",
        );
        let techs = detect(&f);
        let names: Vec<_> = techs.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"PHP"));
        assert!(names.contains(&"ASP.NET"));
    }

    #[test]
    fn body_signatures_match() {
        let body = r#"<script src="/assets/jquery-3.7.1.min.js"></script>
                      <img src="/wp-content/uploads/logo.png">"#;
        let techs = detect(&facts(&[], body));
        let names: Vec<_> = techs.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"jQuery"));
        assert!(names.contains(&"WordPress"));
    }

    #[test]
    fn generator_meta_wins_over_body_signature() {
        let body = r#"<meta name="generator" content="WordPress 6.4">
                      <link href="/wp-content/themes/x/style.css">"#;
        let techs = detect(&facts(&[], body));
        let wordpress: Vec<_> = techs.iter().filter(|t| t.name == "WordPress").collect();
        assert_eq!(wordpress.len(), 1);
        assert_eq!(wordpress[0].version.as_deref(), Some("6.4"));
    }

    #[test]
    fn empty_response_fingerprints_nothing() {
        assert!(detect(&facts(&[], "")).is_empty());
    }
}
