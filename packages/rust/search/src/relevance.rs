//! Keyword relevance filter for search results.
//!
//! Matching is a case-insensitive substring scan: a text is relevant when
//! any keyword occurs anywhere inside it. Keywords are folded to lowercase
//! once, when the [`KeywordSet`] is built.

use coursecraft_shared::{RelevanceConfig, SearchResult};

/// Built-in research / medical keyword list.
pub const RESEARCH_KEYWORDS: &[&str] = &[
    "research", "article", "study", "paper", "journal", "report", "document", "thesis",
    "dissertation", "review", "literature", "source", "abstract", "manuscript", "publication",
    "findings", "results", "investigation", "survey", "exploration", "clinical trial",
    "experiment", "data analysis", "methodology", "hypothesis", "sample study", "case study",
    "data set", "research method", "peer-reviewed", "academic paper", "research paper",
    "study report", "research proposal", "field study", "systematic review",
    "experimental study", "observational study", "control group", "clinical research",
    "medical research", "pharmaceutical research", "biotech research", "drug development",
    "drug discovery", "experimental design", "epidemiological study",
    "randomized control trial", "meta-analysis", "biostatistics", "computational study",
    "therapeutic research", "molecular research", "genetic research", "biomedical research",
    "cancer research", "immunology study", "pathophysiology", "translational research",
    "treatment protocol", "medical innovation", "medical device study", "medical trial",
    "disease research", "pharmacology", "pharmacovigilance", "clinical development",
    "clinical study protocol", "patient safety", "pharmaceutical study", "pharmacokinetics",
    "therapeutic efficacy", "pharmacodynamics", "evidence-based medicine", "drug toxicology",
    "preclinical study", "clinical outcomes", "regulatory affairs", "patent study",
    "artificial intelligence research", "machine learning algorithms", "predictive modeling",
    "computational biology", "quantum computing research", "robotics in medicine",
    "data mining", "neural networks in pharma", "digital health", "telemedicine research",
    "precision medicine", "genomic research", "biotechnology innovation", "CRISPR technology",
    "wearable health technology", "peer-reviewed articles", "research journal",
    "scientific journal", "academic journal", "medical journal", "pharmaceutical journal",
    "research article", "review article", "open access", "editorial", "article abstract",
    "case report", "journal impact factor", "citation analysis", "scopus indexed", "elsevier",
    "springer", "wiley online library", "doi", "pubmed indexed", "neuroscience research",
    "cardiology research", "oncology research", "infectious disease study",
    "pediatrics research", "geriatrics study", "regenerative medicine", "stem cell research",
    "mental health studies", "HIV/AIDS research", "diabetes research", "rare diseases study",
    "autoimmune diseases research", "cardiovascular diseases study", "hepatology research",
    "dermatology study", "orthopedics research", "rheumatology research", "patent research",
    "patent application", "patent literature", "patent filing", "intellectual property",
    "patent search", "patent documentation", "pharmaceutical patent", "drug patent",
    "biotechnology patent", "data-driven research", "research data", "open science",
    "data visualization", "collaborative research", "research collaboration",
    "research network", "research findings", "literature review", "trial report",
    "cohort study", "cross-sectional study", "research grants", "clinical evaluation",
    "research ethics", "scientific method", "study design", "research funding",
    "research institutions", "research organizations", "health policy research",
    "epidemiology research",
];

/// A set of non-empty, lowercased keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Build a set, dropping blank keywords and duplicates.
    ///
    /// An empty keyword would match every text, so it is never stored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut folded: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !folded.contains(&keyword) {
                folded.push(keyword);
            }
        }
        Self { keywords: folded }
    }

    /// The built-in research keyword list.
    pub fn research_default() -> Self {
        Self::new(RESEARCH_KEYWORDS)
    }

    /// Keywords from config, falling back to the built-in list when none
    /// are configured.
    pub fn from_config(config: &RelevanceConfig) -> Self {
        if config.keywords.is_empty() {
            Self::research_default()
        } else {
            Self::new(&config.keywords)
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

/// Whether any keyword occurs in `text`, ignoring case.
pub fn is_relevant(text: &str, keywords: &KeywordSet) -> bool {
    if text.is_empty() || keywords.is_empty() {
        return false;
    }
    let folded = text.to_lowercase();
    keywords.iter().any(|keyword| folded.contains(keyword))
}

/// Keep results whose title or snippet is relevant, in their original order.
pub fn filter_relevant(results: Vec<SearchResult>, keywords: &KeywordSet) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| is_relevant(&r.title, keywords) || is_relevant(&r.snippet, keywords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            link: format!("https://example.org/{}", title.len()),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn matching_ignores_case() {
        let keywords = KeywordSet::new(["Clinical Trial"]);
        assert!(is_relevant("A CLINICAL TRIAL of aspirin", &keywords));
        assert!(is_relevant("phase 3 clinical trial", &keywords));
        assert!(!is_relevant("clinical practice", &keywords));
    }

    #[test]
    fn keyword_inside_word_matches() {
        let keywords = KeywordSet::new(["study"]);
        assert!(is_relevant("case-studying", &keywords));
    }

    #[test]
    fn empty_inputs_never_match() {
        let empty = KeywordSet::new(Vec::<String>::new());
        assert!(!is_relevant("research", &empty));
        assert!(!is_relevant("", &KeywordSet::research_default()));
    }

    #[test]
    fn blank_keywords_are_dropped() {
        let keywords = KeywordSet::new(["", "   ", "DOI", "doi"]);
        assert_eq!(keywords.len(), 1);
        assert!(!is_relevant("unrelated text", &keywords));
    }

    #[test]
    fn default_list_folds_mixed_case_entries() {
        let keywords = KeywordSet::research_default();
        assert!(is_relevant("new crispr technology results", &keywords));
        assert!(is_relevant("hiv/aids research", &keywords));
        assert!(keywords.iter().all(|k| k == k.to_lowercase()));
    }

    #[test]
    fn from_config_falls_back_to_default() {
        let config = RelevanceConfig::default();
        assert_eq!(KeywordSet::from_config(&config), KeywordSet::research_default());

        let config = RelevanceConfig {
            keywords: vec!["stent".into()],
        };
        assert_eq!(KeywordSet::from_config(&config).len(), 1);
    }

    #[test]
    fn filter_checks_title_and_snippet() {
        let keywords = KeywordSet::new(["stent"]);
        let results = vec![
            hit("Stent outcomes", ""),
            hit("Cardiology news", "new stent data"),
            hit("Cardiology news", "new valve data"),
        ];
        let kept = filter_relevant(results, &keywords);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "Stent outcomes");
        assert_eq!(kept[1].snippet, "new stent data");
    }

    #[test]
    fn filter_preserves_order_and_is_idempotent() {
        let keywords = KeywordSet::research_default();
        let results = vec![
            hit("Journal of Medicine", "editorial"),
            hit("Cooking", "pasta"),
            hit("Cohort study of smokers", ""),
            hit("Football", "scores"),
            hit("Pharmacology update", "drug discovery"),
        ];

        let once = filter_relevant(results, &keywords);
        let titles: Vec<&str> = once.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Journal of Medicine", "Cohort study of smokers", "Pharmacology update"]
        );

        let twice = filter_relevant(once.clone(), &keywords);
        assert_eq!(once, twice);
    }

    #[test]
    fn relevance_matches_any_keyword_substring() {
        let keywords = KeywordSet::new(["alpha", "Beta", "gamma ray"]);
        let texts = ["ALPHABET", "betamax", "Gamma Ray burst", "gamma", "delta", ""];
        for text in texts {
            let expected = keywords.iter().any(|k| text.to_lowercase().contains(k));
            assert_eq!(is_relevant(text, &keywords), expected, "text: {text}");
        }
    }
}
