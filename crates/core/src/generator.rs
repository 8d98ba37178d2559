use crate::config::GenerationParams;
use crate::error::ModelError;
use crate::retriever::Retrieval;
use async_trait::async_trait;
use tracing::debug;

pub const NOT_PROCESSED_MESSAGE: &str =
    "⚠️ No hay documentos procesados aún. Por favor, procesa primero una convocatoria.";

const INSTRUCTION_MARKER: &str = "Instrucción:";
const ANSWER_MARKER: &str = "Respuesta:";
const END_OF_TEXT: &str = "<|endoftext|>";
const CONTEXT_SEPARATOR: &str = "\n\n";

pub const ASSISTANT_PERSONA: &str = "Eres un asistente experto en ayudas públicas en España. \
Responde en un tono claro y amable basándote ÚNICAMENTE en el contexto proporcionado. \
Nunca inventes información que no aparezca en el contexto: si no encuentras la respuesta, \
dilo e invita al usuario a revisar el documento. \
Si te piden un resumen, explica el mensaje principal y los requisitos para acceder a la ayuda. \
Termina siempre preguntando amablemente si puedes ayudar en algo más.";

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    /// How many leading context chunks made it into the prompt.
    pub context_used: usize,
}

/// Lays out persona, context and question. Context chunks are taken in order
/// while they fit in `max_context_chars`; the first one is always kept,
/// truncated if it alone exceeds the budget.
pub fn build_prompt(question: &str, context: &[&str], max_context_chars: usize) -> Prompt {
    let mut selected: Vec<String> = Vec::new();
    let mut used_chars = 0usize;

    for chunk in context {
        let chunk_chars = chunk.chars().count();
        if selected.is_empty() {
            let kept: String = chunk.chars().take(max_context_chars).collect();
            used_chars = kept.chars().count();
            selected.push(kept);
            continue;
        }

        let needed = CONTEXT_SEPARATOR.len() + chunk_chars;
        if used_chars + needed > max_context_chars {
            break;
        }
        used_chars += needed;
        selected.push(chunk.to_string());
    }

    let text = format!(
        "{INSTRUCTION_MARKER} {ASSISTANT_PERSONA}\n\nContexto:\n{}\n\nPregunta: {question}\n{ANSWER_MARKER} ",
        selected.join(CONTEXT_SEPARATOR)
    );

    Prompt {
        text,
        context_used: selected.len(),
    }
}

/// Strips an echoed prompt from raw model output, keeping what follows the
/// last answer marker.
///
/// Output without an answer marker is returned untouched.
pub fn clean_answer(raw: &str) -> String {
    let Some((_, after_marker)) = raw.rsplit_once(ANSWER_MARKER) else {
        return raw.to_string();
    };

    let end = [INSTRUCTION_MARKER, END_OF_TEXT]
        .iter()
        .filter_map(|marker| after_marker.find(marker))
        .min()
        .unwrap_or(after_marker.len());

    after_marker[..end].trim().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Generated {
        text: String,
        /// Chunk indexes the prompt was grounded on, in rank order.
        sources: Vec<usize>,
    },
    NotProcessed,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated { text, .. } => text,
            Self::NotProcessed => NOT_PROCESSED_MESSAGE,
        }
    }
}

pub async fn generate_answer(
    generator: &dyn Generator,
    question: &str,
    retrieval: &Retrieval,
    max_context_chars: usize,
    params: &GenerationParams,
) -> Result<Answer, ModelError> {
    let Retrieval::Chunks(hits) = retrieval else {
        return Ok(Answer::NotProcessed);
    };

    let context: Vec<&str> = hits.iter().map(|hit| hit.chunk.text.as_str()).collect();
    let prompt = build_prompt(question, &context, max_context_chars);
    debug!(
        prompt_chars = prompt.text.chars().count(),
        context_used = prompt.context_used,
        "prompt assembled"
    );

    let raw = generator.generate(&prompt.text, params).await?;
    Ok(Answer::Generated {
        text: clean_answer(&raw),
        sources: hits
            .iter()
            .take(prompt.context_used)
            .map(|hit| hit.chunk.index)
            .collect(),
    })
}


#[cfg(test)]
mod tests {
    use super::testing::EchoGenerator;
    use super::*;
    use crate::index::{ScoredChunk, TextChunk};

    fn hit(index: usize, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: TextChunk {
                index,
                text: text.to_string(),
                embedding: Vec::new(),
                document_id: "bases".to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn prompt_has_persona_context_and_question() {
        let prompt = build_prompt("¿Cuál es el plazo?", &["Plazo: 20 días", "Importe: 5.000 €"], 6_000);

        assert!(prompt.text.starts_with("Instrucción: Eres un asistente"));
        assert!(prompt.text.contains("Contexto:\nPlazo: 20 días\n\nImporte: 5.000 €\n\n"));
        assert!(prompt.text.contains("Pregunta: ¿Cuál es el plazo?\n"));
        assert!(prompt.text.ends_with("Respuesta: "));
        assert!(prompt.text.contains("algo más"));
        assert_eq!(prompt.context_used, 2);
    }

    #[test]
    fn context_stops_at_the_budget() {
        let first = "a".repeat(40);
        let second = "b".repeat(40);
        let third = "c".repeat(5);
        let prompt = build_prompt("q", &[&first, &second, &third], 60);

        assert_eq!(prompt.context_used, 1);
        assert!(!prompt.text.contains(&second));
        assert!(!prompt.text.contains(&third));
    }

    #[test]
    fn first_chunk_is_truncated_rather_than_dropped() {
        let long = "x".repeat(100);
        let prompt = build_prompt("q", &[&long], 30);
        assert_eq!(prompt.context_used, 1);
        assert!(prompt.text.contains(&"x".repeat(30)));
        assert!(!prompt.text.contains(&"x".repeat(31)));
    }

    #[test]
    fn cleaning_strips_echoed_prompt() {
        let raw = "Instrucción: reglas\nContexto:\n...\nPregunta: ¿plazo?\nRespuesta:  Veinte días hábiles. <|endoftext|> basura";
        assert_eq!(clean_answer(raw), "Veinte días hábiles.");

        let with_next_turn = "Respuesta: Sí, pueden solicitarla.\nInstrucción: otra cosa";
        assert_eq!(clean_answer(with_next_turn), "Sí, pueden solicitarla.");
    }

    #[tokio::test]
    async fn answer_marker_inside_context_does_not_leak() -> Result<(), ModelError> {
        let generator = EchoGenerator::new("El plazo es de 20 días.");
        let retrieval = Retrieval::Chunks(vec![hit(
            0,
            "Preguntas frecuentes. Pregunta: ¿quién puede pedirla? Respuesta: las pymes.",
        )]);

        let answer = generate_answer(
            &generator,
            "¿plazo?",
            &retrieval,
            6_000,
            &GenerationParams::default(),
        )
        .await?;

        assert_eq!(answer.text(), "El plazo es de 20 días.");
        Ok(())
    }

    #[test]
    fn output_without_marker_is_untouched() {
        let raw = "  El importe máximo es de 10.000 euros.\n";
        assert_eq!(clean_answer(raw), raw);
    }

    #[test]
    fn not_processed_has_the_sentinel_text() {
        assert_eq!(Answer::NotProcessed.text(), NOT_PROCESSED_MESSAGE);
    }

    #[tokio::test]
    async fn generated_answer_is_cleaned_and_sourced() -> Result<(), ModelError> {
        let generator = EchoGenerator::new("El plazo es de 20 días. ¿Puedo ayudarte en algo más?");
        let retrieval = Retrieval::Chunks(vec![hit(4, "Plazo: 20 días"), hit(1, "Objeto")]);

        let answer = generate_answer(
            &generator,
            "¿plazo?",
            &retrieval,
            6_000,
            &GenerationParams::default(),
        )
        .await?;

        assert_eq!(
            answer,
            Answer::Generated {
                text: "El plazo es de 20 días. ¿Puedo ayudarte en algo más?".to_string(),
                sources: vec![4, 1],
            }
        );
        assert_eq!(generator.prompts().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn nothing_is_generated_without_an_index() -> Result<(), ModelError> {
        let generator = EchoGenerator::new("no debería llamarse");
        let answer = generate_answer(
            &generator,
            "¿plazo?",
            &Retrieval::NotProcessed,
            6_000,
            &GenerationParams::default(),
        )
        .await?;

        assert_eq!(answer, Answer::NotProcessed);
        assert!(generator.prompts().is_empty());
        Ok(())
    }
}
