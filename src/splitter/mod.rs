
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Configuration for recursive text splitting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next
    pub chunk_overlap: usize,
    /// Separators in priority order, coarsest first
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                ".".to_string(),
            ],
        }
    }
}

/// Split every page independently and concatenate the resulting chunks
#[inline]
pub fn split_pages(pages: &[String], config: &ChunkingConfig) -> Vec<String> {
    let chunks: Vec<String> = pages
        .iter()
        .flat_map(|page| split_text(page, config))
        .collect();

    debug!(
        "Split {} page(s) into {} chunks (avg {} chars)",
        pages.len(),
        chunks.len(),
        chunks.iter().map(|c| char_len(c)).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Split text into overlapping chunks, preferring the coarsest separator present
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    split_recursive(text, &config.separators, config)
}

fn split_recursive(text: &str, separators: &[String], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();

    // Fall back to the finest separator when none of them occur in the text
    let mut separator = separators.last().map_or("", String::as_str);
    let mut remaining: &[String] = &[];
    for (i, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = "";
            break;
        }
        if text.contains(candidate.as_str()) {
            separator = candidate.as_str();
            remaining = &separators[i + 1..];
            break;
        }
    }

    let pieces = split_keeping_separator(text, separator);
    let mut small_pieces: Vec<String> = Vec::new();

    for piece in pieces {
        if char_len(&piece) < config.chunk_size {
            small_pieces.push(piece);
            continue;
        }

        if !small_pieces.is_empty() {
            chunks.extend(merge_pieces(&small_pieces, config));
            small_pieces.clear();
        }

        if remaining.is_empty() {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
        } else {
            chunks.extend(split_recursive(&piece, remaining, config));
        }
    }

    if !small_pieces.is_empty() {
        chunks.extend(merge_pieces(&small_pieces, config));
    }

    chunks
}

/// Split on `separator`, attaching each separator to the start of the piece that follows it
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();

    if let Some(first) = parts.next() {
        if !first.is_empty() {
            pieces.push(first.to_string());
        }
    }
    pieces.extend(parts.map(|part| format!("{}{}", separator, part)));

    pieces
}

/// Greedily merge small pieces into chunks of at most `chunk_size` characters
fn merge_pieces(pieces: &[String], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut window_len = 0;

    for piece in pieces {
        let piece_len = char_len(piece);

        if window_len + piece_len > config.chunk_size {
            if window_len > config.chunk_size {
                warn!(
                    "Created a chunk of {} characters, longer than the configured {}",
                    window_len, config.chunk_size
                );
            }

            if !window.is_empty() {
                push_joined(&mut chunks, &window);

                // Keep only the tail that fits in the overlap and leaves room for the next piece
                while window_len > config.chunk_overlap
                    || (window_len + piece_len > config.chunk_size && window_len > 0)
                {
                    match window.pop_front() {
                        Some(dropped) => window_len -= char_len(dropped),
                        None => break,
                    }
                }
            }
        }

        window.push_back(piece);
        window_len += piece_len;
    }

    push_joined(&mut chunks, &window);
    chunks
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
