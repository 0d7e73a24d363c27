use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read service catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid service catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service catalog is empty")]
    Empty,

    #[error("duplicate service id: {0}")]
    DuplicateId(String),

    #[error("service {0} has no keywords")]
    NoKeywords(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarageService {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub emoji: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    services: Vec<GarageService>,
}

enum KeywordMatcher {
    Substring(String),
    Token(Regex),
}

impl KeywordMatcher {
    fn new(keyword: &str) -> Self {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && keyword.chars().all(|c| c.is_ascii_digit()) {
            // Digit-only keywords are menu numbers; "1" must not match inside "25/01".
            let pattern = format!(r"\b{}\b", regex::escape(&keyword));
            match Regex::new(&pattern) {
                Ok(re) => return KeywordMatcher::Token(re),
                Err(e) => tracing::warn!(error = %e, keyword = %keyword, "falling back to substring match"),
            }
        }
        KeywordMatcher::Substring(keyword)
    }

    fn matches(&self, lower: &str) -> bool {
        match self {
            KeywordMatcher::Substring(k) => !k.is_empty() && lower.contains(k.as_str()),
            KeywordMatcher::Token(re) => re.is_match(lower),
        }
    }
}

fn compile_matchers(services: &[GarageService]) -> Vec<Vec<KeywordMatcher>> {
    services
        .iter()
        .map(|s| s.keywords.iter().map(|k| KeywordMatcher::new(k)).collect())
        .collect()
}

/// The offered services in match-priority order.
pub struct ServiceCatalog {
    services: Vec<GarageService>,
    matchers: Vec<Vec<KeywordMatcher>>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<GarageService>) -> Result<Self, CatalogError> {
        if services.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for service in &services {
            if !seen.insert(service.id.as_str()) {
                return Err(CatalogError::DuplicateId(service.id.clone()));
            }
            if service.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(CatalogError::NoKeywords(service.id.clone()));
            }
        }

        let matchers = compile_matchers(&services);
        Ok(Self { services, matchers })
    }

    pub fn from_json(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(s)?;
        Self::new(file.services)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn services(&self) -> &[GarageService] {
        &self.services
    }

    pub fn get(&self, id: &str) -> Option<&GarageService> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|s| s.display_name.as_str()).unwrap_or(id)
    }

    /// First service (in catalog order) with a keyword present in `text`.
    pub fn match_text(&self, text: &str) -> Option<&GarageService> {
        let lower = text.to_lowercase();
        self.services
            .iter()
            .zip(&self.matchers)
            .find(|(_, matchers)| matchers.iter().any(|m| m.matches(&lower)))
            .map(|(service, _)| service)
    }

    /// Numbered menu, one line per service.
    pub fn prompt_list(&self) -> String {
        self.services
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let line = format!("{}\u{fe0f}\u{20e3} {} {}", i + 1, s.display_name, s.emoji);
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        let service = |id: &str, name: &str, emoji: &str, keywords: &[&str]| GarageService {
            id: id.to_string(),
            display_name: name.to_string(),
            emoji: emoji.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        let services = vec![
            service("plumbing", "Plumbing", "🚰", &["plumbing", "leak", "pipe", "sink", "1"]),
            service("electrical", "Electrical", "💡", &["electric", "wiring", "light", "2"]),
            service(
                "inspection",
                "General Inspection",
                "🔧",
                &["inspection", "check", "general", "3"],
            ),
        ];

        let matchers = compile_matchers(&services);
        Self { services, matchers }
    }
}

impl std::fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("services", &self.services)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GARAGE: &str = r#"{"services":[
        {"id":"oil_change","display_name":"Oil Change","emoji":"🛢️","keywords":["oil","oil change","1"]},
        {"id":"tyres","display_name":"Tyre Replacement","emoji":"🚗","keywords":["tyre","tire","wheel","2"]},
        {"id":"brakes","display_name":"Brake Check","keywords":["brake","4"]}
    ]}"#;

    #[test]
    fn test_parse_valid_json() {
        let catalog = ServiceCatalog::from_json(GARAGE).unwrap();
        assert_eq!(catalog.services().len(), 3);
        assert_eq!(catalog.display_name("tyres"), "Tyre Replacement");
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            ServiceCatalog::from_json("not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            ServiceCatalog::from_json(r#"{"services":[]}"#),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = r#"{"services":[
            {"id":"a","display_name":"A","keywords":["a"]},
            {"id":"a","display_name":"B","keywords":["b"]}
        ]}"#;
        assert!(matches!(
            ServiceCatalog::from_json(json),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_service_without_keywords_rejected() {
        let json = r#"{"services":[{"id":"a","display_name":"A","keywords":[" "]}]}"#;
        assert!(matches!(
            ServiceCatalog::from_json(json),
            Err(CatalogError::NoKeywords(_))
        ));
    }

    #[test]
    fn test_unknown_id_displays_as_itself() {
        let catalog = ServiceCatalog::default();
        assert_eq!(catalog.display_name("welding"), "welding");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let catalog = ServiceCatalog::from_json(GARAGE).unwrap();
        assert_eq!(catalog.match_text("Need an OIL change").unwrap().id, "oil_change");
        assert_eq!(catalog.match_text("flat TIRE").unwrap().id, "tyres");
    }

    #[test]
    fn test_numeric_keyword_is_whole_token() {
        let catalog = ServiceCatalog::from_json(GARAGE).unwrap();
        assert_eq!(catalog.match_text("4").unwrap().id, "brakes");
        assert!(catalog.match_text("14").is_none());
        assert!(catalog.match_text("41st").is_none());
    }

    #[test]
    fn test_first_service_wins() {
        let catalog = ServiceCatalog::from_json(GARAGE).unwrap();
        assert_eq!(catalog.match_text("oil and tyres").unwrap().id, "oil_change");
    }

    #[test]
    fn test_prompt_list() {
        let catalog = ServiceCatalog::from_json(GARAGE).unwrap();
        let list = catalog.prompt_list();
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "1\u{fe0f}\u{20e3} Oil Change 🛢️");
        assert_eq!(lines[2], "3\u{fe0f}\u{20e3} Brake Check");
    }

    #[test]
    fn test_shipped_garage_catalog_parses() {
        let catalog =
            ServiceCatalog::from_json(include_str!("../../config/services.garage.json")).unwrap();
        assert_eq!(catalog.services().len(), 4);
        assert_eq!(catalog.match_text("2").unwrap().display_name, "Tyre Replacement");
    }
}
