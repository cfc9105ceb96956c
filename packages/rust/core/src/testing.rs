//! In-memory collaborators for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use analyst_llm::{Completion, CompletionModel, Embedder};
use analyst_search::{SearchHit, SearchResponse, WebSearch};
use analyst_shared::{AnalystError, Result, RetrievedChunk};
use async_trait::async_trait;

use crate::pipeline::ProgressReporter;
use crate::retrieval::NearestNeighbors;
use crate::state::PipelineState;

pub enum FakeSearch {
    Hits(Vec<&'static str>),
    Fails(&'static str),
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, _query: &str, _max_results: u32) -> Result<SearchResponse> {
        match self {
            Self::Hits(hits) => Ok(SearchResponse {
                results: hits
                    .iter()
                    .map(|content| SearchHit {
                        content: content.to_string(),
                        title: None,
                        url: None,
                        score: None,
                    })
                    .collect(),
            }),
            Self::Fails(message) => Err(AnalystError::Network(message.to_string())),
        }
    }
}

pub struct FakeIndex {
    chunks: Vec<&'static str>,
    fail: bool,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl FakeIndex {
    pub fn with(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            fail: false,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            chunks: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NearestNeighbors for FakeIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(AnalystError::Retrieval("index unavailable".into()));
        }
        Ok(self
            .chunks
            .iter()
            .take(k)
            .map(|text| RetrievedChunk {
                text: text.to_string(),
                source: "fixture".into(),
                score: 1.0,
            })
            .collect())
    }
}

/// Replies from a script, recording every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<&'static str, &'static str>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<std::result::Result<&'static str, &'static str>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err("script exhausted"));
        match reply {
            Ok(text) => Ok(Completion {
                text: text.to_string(),
                model: "scripted".into(),
                tokens_in: 0,
                tokens_out: 0,
                latency_ms: 0,
            }),
            Err(message) => Err(AnalystError::Completion(message.to_string())),
        }
    }
}

/// Embeds text as `[len, vowel count]`; counts calls.
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
        Ok(vec![text.len() as f32, vowels as f32 + 1.0])
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub phases: Mutex<Vec<String>>,
    pub finished: AtomicUsize,
}

impl ProgressReporter for RecordingProgress {
    fn phase(&self, name: &str) {
        self.phases.lock().unwrap().push(name.to_string());
    }

    fn done(&self, _state: &PipelineState) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
