//! User-facing workflows over an explicit [`Session`].

use coursecraft_generation::{
    GenerationClient, GenerationOptions, OutputShape, build_document_question, build_prompt,
    system_role,
};
use coursecraft_render::{DocumentStyle, extract_pdf_text};
use coursecraft_search::{KeywordSet, SearchClient, SearchOptions, is_relevant};
use coursecraft_shared::{
    AppConfig, ContentKind, CourseCraftError, DocumentFormat, GeneratedContent, Query, Result,
    SearchResult, Session,
};
use tracing::{debug, info, instrument, warn};

use crate::delivery::{Delivery, ExportOptions};
use crate::export::Exporter;

/// Progress callback for long-running workflow steps.
pub trait ProgressReporter: Send + Sync {
    /// Called when a workflow enters a new step.
    fn phase(&self, name: &str);
    /// Called once the workflow finished, successfully or not.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self) {}
}

/// Clients plus the settings every workflow needs.
pub struct Workbench {
    generation: GenerationClient,
    search: Option<SearchClient>,
    keywords: KeywordSet,
    exporter: Exporter,
    progress: Box<dyn ProgressReporter>,
}

impl Workbench {
    pub fn new(
        generation: GenerationClient,
        search: Option<SearchClient>,
        keywords: KeywordSet,
        style: DocumentStyle,
    ) -> Self {
        Self {
            generation,
            search,
            keywords,
            exporter: Exporter::new(style),
            progress: Box::new(SilentProgress),
        }
    }

    /// Build a workbench from config. Search is optional: without its
    /// credentials every other workflow still works.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generation = GenerationClient::new(GenerationOptions::from_config(config)?)?;

        let search = match SearchOptions::from_config(config) {
            Ok(opts) => Some(SearchClient::new(&opts)?),
            Err(e) => {
                debug!(error = %e, "search disabled");
                None
            }
        };

        Ok(Self::new(
            generation,
            search,
            KeywordSet::from_config(&config.relevance),
            Exporter::style_from_config(config)?,
        ))
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Generate content for `query` in the requested shape.
    ///
    /// The returned session always records the query; it only carries
    /// content when generation succeeded.
    #[instrument(skip_all, fields(domain = %query.domain, shape = %shape))]
    pub async fn ask(
        &self,
        session: Session,
        query: Query,
        shape: OutputShape,
    ) -> (Session, Result<GeneratedContent>) {
        let session = session.with_query(query.clone());

        self.progress.phase("Generating content");
        let prompt = build_prompt(&query.domain, &query.text, shape);
        let role = system_role(&query.domain, shape);
        let result = self
            .generation
            .generate_for(shape, &prompt, role.as_deref())
            .await;
        self.progress.done();

        match result {
            Ok(text) => {
                info!(chars = text.len(), "content generated");
                let content = GeneratedContent::new(text, shape, query);
                (session.with_content(content.clone()), Ok(content))
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                (session, Err(e))
            }
        }
    }

    /// Answer `question` about an uploaded PDF.
    #[instrument(skip_all, fields(%domain, size = pdf_bytes.len()))]
    pub async fn analyze_document(
        &self,
        session: Session,
        domain: &str,
        pdf_bytes: &[u8],
        question: &str,
    ) -> (Session, Result<GeneratedContent>) {
        let query = Query::new(domain, question);
        let session = session.with_query(query.clone());

        self.progress.phase("Extracting text");
        let context = match extract_pdf_text(pdf_bytes) {
            Ok(text) => text,
            Err(e) => {
                self.progress.done();
                return (session, Err(e));
            }
        };
        debug!(chars = context.len(), "document text extracted");

        self.progress.phase("Analyzing document");
        let prompt = build_document_question(&context, question);
        let role = system_role(domain, ContentKind::FreeText);
        let result = self
            .generation
            .generate_for(ContentKind::FreeText, &prompt, role.as_deref())
            .await;
        self.progress.done();

        match result {
            Ok(text) => {
                let content = GeneratedContent::new(text, ContentKind::FreeText, query);
                (session.with_content(content.clone()), Ok(content))
            }
            Err(e) => {
                warn!(error = %e, "document analysis failed");
                (session, Err(e))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Whether `query` mentions any configured research keyword.
    pub fn query_is_relevant(&self, query: &str) -> bool {
        is_relevant(query, &self.keywords)
    }

    /// Search and keep only relevant hits.
    #[instrument(skip(self))]
    pub async fn research(&self, query: &str) -> Result<Vec<SearchResult>> {
        let client = self.search.as_ref().ok_or_else(|| {
            CourseCraftError::config("search is not configured (missing API key or engine id)")
        })?;

        self.progress.phase("Searching");
        let result = client.search_relevant(query, &self.keywords).await;
        self.progress.done();
        result
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Render `content` as `format` and wrap it in a SCORM package.
    pub fn export(
        &self,
        content: &GeneratedContent,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> Result<Delivery> {
        self.progress.phase("Rendering and packaging");
        let result = self.exporter.export(content, format, options);
        self.progress.done();
        result
    }

    /// Render a slide outline as a bare `.pptx`, without packaging.
    pub fn export_slides_raw(&self, content: &GeneratedContent) -> Result<Delivery> {
        self.exporter.export_slides_raw(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    use coursecraft_render::render_pdf;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        })
    }

    fn workbench(server: &MockServer, search: bool) -> Workbench {
        let generation = GenerationClient::new(GenerationOptions {
            base_url: format!("{}/v1", server.uri()),
            api_key: "sk-test".into(),
            model: "gpt-3.5-turbo".into(),
            slides_model: "gpt-4".into(),
            timeout_secs: 5,
        })
        .unwrap();
        let search = search.then(|| {
            SearchClient::new(&SearchOptions {
                base_url: format!("{}/customsearch/v1", server.uri()),
                api_key: "key".into(),
                engine_id: "cx".into(),
                timeout_secs: 5,
            })
            .unwrap()
        });
        Workbench::new(
            generation,
            search,
            KeywordSet::research_default(),
            DocumentStyle::default(),
        )
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[tokio::test]
    async fn ask_then_export_pdf_package() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("Cardiology"))
            .and(body_string_contains("recent stent trials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Recent trials compared drug-eluting stents with bypass surgery.",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let bench = workbench(&server, false);
        let (session, result) = bench
            .ask(
                Session::default(),
                Query::new("Cardiology", "recent stent trials"),
                OutputShape::FreeText,
            )
            .await;
        let content = result.unwrap();
        assert_eq!(session.last_content.as_ref(), Some(&content));

        let delivery = bench
            .export(&content, DocumentFormat::Pdf, &ExportOptions::default())
            .unwrap();
        assert_eq!(delivery.file_name, "scorm_package.zip");
        assert_eq!(delivery.mime_type, "application/zip");

        let entries = coursecraft_package::validate_package(&delivery.bytes).unwrap();
        assert!(entries.contains("content.pdf"));
        assert!(entries.contains("imsmanifest.xml"));

        let manifest = read_entry(&delivery.bytes, "imsmanifest.xml");
        assert!(manifest.contains(r#"<file href="content.pdf"/>"#));
        assert!(manifest.contains(r#"<file href="index.html"/>"#));

        let mut archive = zip::ZipArchive::new(Cursor::new(delivery.bytes.as_slice())).unwrap();
        let mut pdf = Vec::new();
        archive.by_name("content.pdf").unwrap().read_to_end(&mut pdf).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn failed_generation_leaves_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": {"message": "overloaded"}})),
            )
            .mount(&server)
            .await;

        let bench = workbench(&server, false);
        let query = Query::new("Cardiology", "recent stent trials");
        let (session, result) = bench
            .ask(Session::default(), query.clone(), OutputShape::FreeText)
            .await;

        assert!(matches!(result, Err(CourseCraftError::Generation(_))));
        assert_eq!(session.last_query, Some(query));
        assert!(session.last_content.is_none());
    }

    #[tokio::test]
    async fn new_query_clears_previous_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let bench = workbench(&server, false);
        let earlier = GeneratedContent::new(
            "old",
            ContentKind::FreeText,
            Query::new("Cardiology", "old question"),
        );
        let session = Session::default().with_content(earlier);
        let (session, result) = bench
            .ask(session, Query::new("Cardiology", "new question"), OutputShape::FreeText)
            .await;

        assert!(result.is_err());
        assert!(session.last_content.is_none());
    }

    #[test]
    fn export_rejects_mismatched_format() {
        let server_uri = "http://127.0.0.1:9";
        let bench = Workbench::new(
            GenerationClient::new(GenerationOptions {
                base_url: server_uri.into(),
                api_key: "k".into(),
                model: "m".into(),
                slides_model: "m".into(),
                timeout_secs: 1,
            })
            .unwrap(),
            None,
            KeywordSet::research_default(),
            DocumentStyle::default(),
        );
        let content = GeneratedContent::new(
            "Trial,Year\nSYNTAX,2009\n",
            ContentKind::CsvTable,
            Query::new("Cardiology", "trials"),
        );

        let err = bench
            .export(&content, DocumentFormat::Pdf, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, CourseCraftError::Validation { .. }));

        let delivery = bench
            .export(&content, DocumentFormat::Csv, &ExportOptions::default())
            .unwrap();
        let entries = coursecraft_package::validate_package(&delivery.bytes).unwrap();
        assert!(entries.contains("data.csv"));

        assert!(bench.export_slides_raw(&content).is_err());
    }

    #[tokio::test]
    async fn slide_outline_exports_raw_and_packaged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("gpt-4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Intro: Hello world\n\nKey Point: Detail A. Detail B.",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let bench = workbench(&server, false);
        let (_, result) = bench
            .ask(
                Session::default(),
                Query::new("Cardiology", "stents"),
                OutputShape::SlideOutline,
            )
            .await;
        let content = result.unwrap();

        let raw = bench.export_slides_raw(&content).unwrap();
        assert_eq!(raw.file_name, "presentation.pptx");
        assert!(raw.bytes.starts_with(b"PK"));

        let packaged = bench
            .export(&content, DocumentFormat::Pptx, &ExportOptions::default())
            .unwrap();
        let entries = coursecraft_package::validate_package(&packaged.bytes).unwrap();
        assert!(entries.contains("presentation.pptx"));
    }

    #[tokio::test]
    async fn analyze_document_sends_context_and_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Context:"))
            .and(body_string_contains("Question: What was the primary endpoint?"))
            .and(body_string_contains("Stent thrombosis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Death or MI.")))
            .expect(1)
            .mount(&server)
            .await;

        let pdf = render_pdf("Stent thrombosis was rare.", &DocumentStyle::default()).unwrap();
        let bench = workbench(&server, false);
        let (session, result) = bench
            .analyze_document(
                Session::default(),
                "Cardiology",
                &pdf,
                "What was the primary endpoint?",
            )
            .await;

        assert_eq!(result.unwrap().text, "Death or MI.");
        assert!(session.last_content.is_some());
    }

    #[tokio::test]
    async fn analyze_rejects_non_pdf() {
        let server = MockServer::start().await;
        let bench = workbench(&server, false);
        let (session, result) = bench
            .analyze_document(Session::default(), "Cardiology", b"plain text", "q")
            .await;
        assert!(result.is_err());
        assert!(session.last_content.is_none());
    }

    #[tokio::test]
    async fn research_filters_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "stent trials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "Clinical trial of stents", "link": "https://a", "snippet": "..."},
                    {"title": "Cooking tips", "link": "https://b", "snippet": "pasta"}
                ]
            })))
            .mount(&server)
            .await;

        let bench = workbench(&server, true);
        let hits = bench.research("stent trials").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link, "https://a");
        assert!(bench.query_is_relevant("stent clinical trial"));
    }

    #[tokio::test]
    async fn research_without_search_is_config_error() {
        let server = MockServer::start().await;
        let bench = workbench(&server, false);
        let err = bench.research("stents").await.unwrap_err();
        assert!(matches!(err, CourseCraftError::Config { .. }));
    }
}
