use crate::config::ChunkingConfig;
use crate::error::IngestError;

/// Greedy fixed-window slicing over characters.
///
/// Windows start every `max_chars - overlap_chars` characters, so consecutive
/// windows share exactly `overlap_chars` characters; only the last may be
/// shorter. Slicing stops once the next start would fall inside the final
/// overlap, which keeps a trailing window from repeating text already covered.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let stop = chars.len().saturating_sub(config.overlap_chars);
    let stride = config.stride();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += stride;
        if start >= stop {
            break;
        }
    }

    Ok(chunks)
}
