//! Mock capabilities for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GraphInsight, MemoryEntry, WorkflowDraft};
use crate::domain::ports::{
    ChatMessage, DryRunReport, DryRunner, GenerateOptions, GraphUpdate, KnowledgeGraph,
    LanguageModel, MemoryStore, ScopeSummary,
};

/// Scripted language model. Returns canned responses in order, repeating
/// the last one when the script runs out.
pub struct MockLanguageModel {
    available: bool,
    fail: bool,
    delay: Option<Duration>,
    responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    pub fn scripted(response: impl Into<String>) -> Self {
        Self {
            available: true,
            fail: false,
            delay: None,
            responses: Mutex::new(vec![response.into()]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted_sequence(responses: Vec<String>) -> Self {
        Self {
            available: true,
            fail: false,
            delay: None,
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            fail: false,
            delay: None,
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            available: true,
            fail: true,
            delay: None,
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay every call, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn next_response(&self, prompt: &str) -> DomainResult<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(prompt.to_string());

        if self.fail {
            return Err(DomainError::capability("language_model", "mock failure"));
        }

        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if responses.is_empty() {
            return Err(DomainError::capability("language_model", "mock script empty"));
        }
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            Ok(responses[0].clone())
        }
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> DomainResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_response(prompt)
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> DomainResult<String> {
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.generate(&prompt, options).await
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        // Deterministic toy embedding: character-count buckets.
        let mut vector = vec![0.0f32; 8];
        for (i, c) in text.chars().enumerate() {
            vector[i % 8] += (c as u32 % 13) as f32 / 13.0;
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Knowledge graph returning a canned insight, or failing on demand.
pub struct MockKnowledgeGraph {
    insight: GraphInsight,
    fail: bool,
}

impl MockKnowledgeGraph {
    pub fn canned(insight: GraphInsight) -> Self {
        Self {
            insight,
            fail: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            insight: GraphInsight::default(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            insight: GraphInsight::default(),
            fail: true,
        }
    }
}

#[async_trait]
impl KnowledgeGraph for MockKnowledgeGraph {
    async fn query(&self, _text: &str) -> DomainResult<GraphInsight> {
        if self.fail {
            return Err(DomainError::capability("knowledge_graph", "mock failure"));
        }
        Ok(self.insight.clone())
    }

    async fn apply_update(&self, _update: GraphUpdate) -> DomainResult<()> {
        Ok(())
    }

    async fn invalidate_cache(&self) -> DomainResult<()> {
        Ok(())
    }
}

/// Dry runner with a fixed verdict.
pub struct MockDryRunner {
    report: Option<DryRunReport>,
}

impl MockDryRunner {
    pub fn accepting() -> Self {
        Self {
            report: Some(DryRunReport::accepted()),
        }
    }

    pub fn rejecting(diagnostics: Vec<String>) -> Self {
        Self {
            report: Some(DryRunReport::rejected(diagnostics)),
        }
    }

    pub fn failing() -> Self {
        Self { report: None }
    }
}

#[async_trait]
impl DryRunner for MockDryRunner {
    async fn submit(&self, _draft: &WorkflowDraft) -> DomainResult<DryRunReport> {
        match &self.report {
            Some(report) => Ok(report.clone()),
            None => Err(DomainError::capability("dry_run", "mock failure")),
        }
    }
}

/// In-memory MemoryStore for unit tests; mirrors the sqlite adapter's
/// upsert and raw-row semantics.
pub struct InMemoryMemoryStore {
    entries: RwLock<HashMap<(String, String), MemoryEntry>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn set(&self, entry: &MemoryEntry) -> DomainResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert((entry.scope.clone(), entry.key.clone()), entry.clone());
        Ok(())
    }

    async fn get(&self, scope: &str, key: &str) -> DomainResult<Option<MemoryEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope.to_string(), key.to_string())).cloned())
    }

    async fn list(&self, scope: &str) -> DomainResult<Vec<MemoryEntry>> {
        let entries = self.entries.read().await;
        let mut result: Vec<MemoryEntry> = entries
            .values()
            .filter(|e| e.scope == scope)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(result)
    }

    async fn scopes(&self) -> DomainResult<Vec<ScopeSummary>> {
        let entries = self.entries.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for entry in entries.values() {
            *counts.entry(entry.scope.clone()).or_default() += 1;
        }
        let mut summaries: Vec<ScopeSummary> = counts
            .into_iter()
            .map(|(scope, entries)| ScopeSummary { scope, entries })
            .collect();
        summaries.sort_by(|a, b| a.scope.cmp(&b.scope));
        Ok(summaries)
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        Ok((before - entries.len()) as u64)
    }
}
