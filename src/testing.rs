// In-process stand-ins for the embedding server, vector database and generator

use anyhow::anyhow;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::rc::Rc;
use zip::write::SimpleFileOptions;

use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::vector::{IndexSpec, QueryMatch, StoredRecord, VectorDatabase, VectorIndex};

pub(crate) const FAKE_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedding: identical texts map to identical unit vectors
#[derive(Debug, Default, Clone)]
pub(crate) struct HashingEmbedder {
    calls: Rc<RefCell<usize>>,
}

impl HashingEmbedder {
    pub(crate) fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    pub(crate) fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; FAKE_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) % FAKE_DIMENSION as u64;
            vector[bucket as usize] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        *self.calls.borrow_mut() += 1;
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Embedder whose server is always unreachable
#[derive(Debug, Default)]
pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow!("Transport error: connection refused"))
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    indexes: BTreeMap<String, BTreeMap<String, StoredRecord>>,
    specs: Vec<IndexSpec>,
    upsert_calls: usize,
    query_calls: usize,
}

/// In-memory vector database ranking by cosine similarity; clones share state
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryDatabase {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryDatabase {
    pub(crate) fn created(&self) -> Vec<IndexSpec> {
        self.state.borrow().specs.clone()
    }

    pub(crate) fn record_ids(&self, index: &str) -> Vec<String> {
        self.state
            .borrow()
            .indexes
            .get(index)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn record(&self, index: &str, id: &str) -> Option<StoredRecord> {
        self.state
            .borrow()
            .indexes
            .get(index)
            .and_then(|records| records.get(id).cloned())
    }

    pub(crate) fn upsert_calls(&self) -> usize {
        self.state.borrow().upsert_calls
    }

    pub(crate) fn query_calls(&self) -> usize {
        self.state.borrow().query_calls
    }
}

impl VectorDatabase for MemoryDatabase {
    fn list_indexes(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.state.borrow().indexes.keys().cloned().collect())
    }

    fn create_index(&self, spec: &IndexSpec) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        state.specs.push(spec.clone());
        state.indexes.entry(spec.name.clone()).or_default();
        Ok(())
    }

    fn open_index(&self, name: &str) -> anyhow::Result<Box<dyn VectorIndex>> {
        if !self.state.borrow().indexes.contains_key(name) {
            return Err(anyhow!("Client error: HTTP 404"));
        }
        Ok(Box::new(MemoryIndex {
            name: name.to_string(),
            state: Rc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct MemoryIndex {
    name: String,
    state: Rc<RefCell<MemoryState>>,
}

impl VectorIndex for MemoryIndex {
    fn upsert(&self, records: &[StoredRecord]) -> anyhow::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.upsert_calls += 1;
        let index = state.indexes.entry(self.name.clone()).or_default();
        for record in records {
            index.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<QueryMatch>> {
        let mut state = self.state.borrow_mut();
        state.query_calls += 1;
        let mut matches: Vec<QueryMatch> = state
            .indexes
            .get(&self.name)
            .into_iter()
            .flat_map(|records| records.values())
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine(vector, &record.values),
                metadata: Some(record.metadata.clone()),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn record_count(&self) -> anyhow::Result<u64> {
        let state = self.state.borrow();
        Ok(state.indexes.get(&self.name).map_or(0, |r| r.len() as u64))
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Index that answers every query with the same ranked matches
#[derive(Debug, Default)]
pub(crate) struct ScriptedIndex {
    pub(crate) matches: Vec<QueryMatch>,
}

impl VectorIndex for ScriptedIndex {
    fn upsert(&self, records: &[StoredRecord]) -> anyhow::Result<usize> {
        Ok(records.len())
    }

    fn query(&self, _vector: &[f32], top_k: usize) -> anyhow::Result<Vec<QueryMatch>> {
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    fn record_count(&self) -> anyhow::Result<u64> {
        Ok(self.matches.len() as u64)
    }
}

/// Index whose service rejects every data-plane call
#[derive(Debug, Default)]
pub(crate) struct UnavailableIndex;

impl VectorIndex for UnavailableIndex {
    fn upsert(&self, _records: &[StoredRecord]) -> anyhow::Result<usize> {
        Err(anyhow!("Server error: HTTP 503"))
    }

    fn query(&self, _vector: &[f32], _top_k: usize) -> anyhow::Result<Vec<QueryMatch>> {
        Err(anyhow!("Server error: HTTP 503"))
    }

    fn record_count(&self) -> anyhow::Result<u64> {
        Err(anyhow!("Server error: HTTP 503"))
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Fixed(String),
    EchoContext,
    Fail(String),
}

/// Generator with a canned behavior that records every prompt it receives
#[derive(Debug, Clone)]
pub(crate) struct ScriptedGenerator {
    reply: Reply,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedGenerator {
    pub(crate) fn replying(text: &str) -> Self {
        Self::with(Reply::Fixed(text.to_string()))
    }

    /// Answers with the context section of the prompt
    pub(crate) fn echoing_context() -> Self {
        Self::with(Reply::EchoContext)
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::with(Reply::Fail(message.to_string()))
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Rc::default(),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match &self.reply {
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::EchoContext => {
                let context = prompt
                    .split_once("Context:\n")
                    .and_then(|(_, rest)| rest.split_once("\n\nUser Query:"))
                    .map_or("", |(context, _)| context);
                Ok(context.to_string())
            }
            Reply::Fail(message) => Err(anyhow!("{}", message)),
        }
    }
}

/// A minimal DOCX container holding one text run per paragraph
pub(crate) fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect::<Vec<_>>()
        .concat();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"urn:w\"><w:body>{}</w:body></w:document>",
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .expect("should start zip entry");
    writer
        .write_all(xml.as_bytes())
        .expect("should write zip entry");
    writer.finish().expect("should finish zip").into_inner()
}

/// A PDF with one page per entry, each drawing its text in a standard font
pub(crate) fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("page content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf should serialize");
    bytes
}
