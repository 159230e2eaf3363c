//! Pipeline orchestrator for Nova.
//!
//! Wires the stores, providers, and extractors together and exposes the
//! high-level operations the CLI calls: ingest, ask, search, summarize,
//! remember, recall.

use crate::chunking::{chunk_text, ChunkConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{NovaError, Result};
use crate::lang::Language;
use crate::llm::{ChatProvider, OpenAIChat};
use crate::memory::MemoryStore;
use crate::rag::{Answer, GroundedAnswerer, Retriever};
use crate::source::{MemoryNote, SourceDocument, SourceKind};
use crate::summarize::Summarizer;
use crate::transcript::{
    ExtractedTranscript, TranscriptExtractor, VideoSource, WhisperExtractor,
    YoutubeCaptionExtractor,
};
use crate::vector_store::{
    IndexEntry, MemoryVectorStore, Partition, ScoredChunk, SearchFilter, SourceSummary,
    SqliteVectorStore, VectorStore,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// The main orchestrator for the Nova pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatProvider>,
    youtube: Box<dyn TranscriptExtractor>,
    whisper: Box<dyn TranscriptExtractor>,
    memory: MemoryStore,
}

/// Result of ingesting one source.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub source_id: Uuid,
    pub title: String,
    pub chunks_indexed: usize,
}

/// Result of summarizing a video.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub title: String,
    pub summary: String,
    /// Set when the transcript was also indexed.
    pub indexed_source: Option<Uuid>,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let mut prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        prompts.variables = settings.prompts.variables.clone();

        let retry = settings.retry_policy();
        let timeout = Duration::from_secs(settings.provider.timeout_secs);

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions,
            retry.clone(),
            timeout,
        ));

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new(settings.embedding.dimensions)),
            "sqlite" => Arc::new(SqliteVectorStore::new(
                &settings.sqlite_path(),
                &settings.embedding.model,
                settings.embedding.dimensions,
            )?),
            other => {
                return Err(NovaError::InvalidConfig(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let chat: Arc<dyn ChatProvider> = Arc::new(OpenAIChat::new(
            &settings.provider.chat_model,
            retry.clone(),
            timeout,
        ));

        let youtube: Box<dyn TranscriptExtractor> =
            Box::new(YoutubeCaptionExtractor::new(settings.provider.timeout_secs)?);
        let whisper: Box<dyn TranscriptExtractor> = Box::new(WhisperExtractor::with_config(
            &settings.provider.whisper_model,
            settings.provider.timeout_secs,
        )?);

        Self::with_components(
            settings, prompts, embedder, vector_store, chat, youtube, whisper,
        )
    }

    /// Create an orchestrator with custom components.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
        youtube: Box<dyn TranscriptExtractor>,
        whisper: Box<dyn TranscriptExtractor>,
    ) -> Result<Self> {
        settings.validate()?;

        let memory = MemoryStore::new(vector_store.clone(), embedder.clone())
            .with_chunking(chunk_config(&settings))
            .with_retriever(
                Retriever::new(vector_store.clone(), embedder.clone())
                    .with_k(settings.retrieval.k)
                    .with_min_score(settings.retrieval.min_score),
            );

        Ok(Self {
            settings,
            prompts,
            embedder,
            vector_store,
            chat,
            youtube,
            whisper,
            memory,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Ingest a text document: store it, chunk it, embed it, index it.
    ///
    /// If any stage fails, everything written for the document is removed
    /// again; a source is only ever fully indexed or absent.
    #[instrument(skip(self, text), fields(kind = %kind, title = %title))]
    pub async fn ingest_text(
        &self,
        kind: SourceKind,
        title: &str,
        text: &str,
        language: Option<Language>,
    ) -> Result<IngestResult> {
        if text.trim().is_empty() {
            return Err(NovaError::InvalidInput(
                "Nothing to ingest: document is empty".to_string(),
            ));
        }

        let doc = match language {
            Some(lang) => SourceDocument::new(kind, title, text).with_language(lang),
            None => SourceDocument::new(kind, title, text),
        };
        self.vector_store.put_source(&doc).await?;

        match self.index_document(&doc).await {
            Ok(chunks_indexed) => {
                info!(source_id = %doc.id, chunks = chunks_indexed, "Ingested source");
                Ok(IngestResult {
                    source_id: doc.id,
                    title: doc.title,
                    chunks_indexed,
                })
            }
            Err(e) => {
                warn!(source_id = %doc.id, "Ingestion failed, rolling back");
                if let Err(cleanup) = self.vector_store.delete_source(doc.id).await {
                    warn!(source_id = %doc.id, error = %cleanup, "Rollback also failed");
                }
                Err(e)
            }
        }
    }

    /// Ingest a local text or markdown file.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestResult> {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "txt" | "md" | "markdown"))
            .unwrap_or(false);
        if !supported {
            return Err(NovaError::UnsupportedSource(format!(
                "{} is not a supported document type (txt, md)",
                path.display()
            )));
        }

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            NovaError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();

        self.ingest_text(SourceKind::UploadedFile, &title, &text, None)
            .await
    }

    async fn index_document(&self, doc: &SourceDocument) -> Result<usize> {
        let chunks = chunk_text(doc.id, &doc.text, &chunk_config(&self.settings))?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                IndexEntry::new(chunk, embedding, doc.kind, Partition::Documents, doc.language)
            })
            .collect();
        self.vector_store.upsert(&entries).await
    }

    /// Answer a question grounded in the indexed documents.
    pub async fn ask(&self, question: &str, kind: Option<SourceKind>) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(NovaError::InvalidInput("Empty question".to_string()));
        }

        let filter = SearchFilter {
            partition: Some(Partition::Documents),
            kind,
        };
        let retrieved = self.retriever().retrieve(question, &filter).await?;
        let answerer =
            GroundedAnswerer::new(self.chat.clone()).with_prompts(self.prompts.clone());
        answerer.answer(question, &retrieved).await
    }

    /// Raw similarity search without answer generation.
    pub async fn search(
        &self,
        query: &str,
        kind: Option<SourceKind>,
    ) -> Result<Vec<ScoredChunk>> {
        let filter = SearchFilter {
            partition: Some(Partition::Documents),
            kind,
        };
        self.retriever().retrieve(query, &filter).await
    }

    /// Summarize a video (YouTube URL/ID or local media file) in the given
    /// language, optionally indexing the transcript afterwards.
    #[instrument(skip(self), fields(input = %input, language = %language))]
    pub async fn summarize_video(
        &self,
        input: &str,
        language: Language,
        index_transcript: bool,
    ) -> Result<VideoSummary> {
        let source = VideoSource::parse(input)?;
        let transcript = self.extract(&source).await?;

        let summary = self
            .summarizer()
            .summarize_transcript(&transcript, language)
            .await?;

        let indexed_source = if index_transcript {
            let result = self
                .ingest_text(
                    SourceKind::Transcript,
                    &transcript.title,
                    &transcript.text,
                    transcript.language,
                )
                .await?;
            Some(result.source_id)
        } else {
            None
        };

        Ok(VideoSummary {
            title: transcript.title,
            summary,
            indexed_source,
        })
    }

    /// Summarize arbitrary text in the given language.
    pub async fn summarize_text(&self, text: &str, language: Language) -> Result<String> {
        self.summarizer().summarize(text, language).await
    }

    async fn extract(&self, source: &VideoSource) -> Result<ExtractedTranscript> {
        match source {
            VideoSource::YouTube { .. } => self.youtube.extract(source).await,
            VideoSource::Local(_) => self.whisper.extract(source).await,
        }
    }

    /// Store a memory note.
    pub async fn remember(
        &self,
        title: Option<String>,
        text: &str,
        tags: Vec<String>,
    ) -> Result<MemoryNote> {
        self.memory.remember(title, text, tags).await
    }

    /// Recall memory notes relevant to a query.
    pub async fn recall(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.memory.recall(query).await
    }

    /// Replace a note with a corrected one.
    pub async fn supersede(
        &self,
        old_id: Uuid,
        title: Option<String>,
        text: &str,
        tags: Vec<String>,
    ) -> Result<MemoryNote> {
        self.memory.supersede(old_id, title, text, tags).await
    }

    /// List stored memory notes.
    pub async fn list_notes(&self, include_superseded: bool) -> Result<Vec<MemoryNote>> {
        self.memory.list(include_superseded).await
    }

    /// List indexed sources.
    pub async fn list_sources(&self, partition: Option<Partition>) -> Result<Vec<SourceSummary>> {
        self.vector_store.list_sources(partition).await
    }

    /// Delete a source and its index entries.
    pub async fn delete_source(&self, source_id: Uuid) -> Result<usize> {
        self.vector_store.delete_source(source_id).await
    }

    fn retriever(&self) -> Retriever {
        Retriever::new(self.vector_store.clone(), self.embedder.clone())
            .with_k(self.settings.retrieval.k)
            .with_min_score(self.settings.retrieval.min_score)
    }

    fn summarizer(&self) -> Summarizer {
        Summarizer::new(self.chat.clone(), self.settings.summarize.clone())
            .with_prompts(self.prompts.clone())
    }
}

fn chunk_config(settings: &Settings) -> ChunkConfig {
    ChunkConfig {
        max_chars: settings.chunking.max_chars,
        overlap_chars: settings.chunking.overlap_chars,
    }
}
