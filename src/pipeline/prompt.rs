//! Generation prompt and citation contract.
//!
//! One fixed system prompt constrains the generative model: every
//! substantive claim must carry a citation marker followed by a verbatim
//! quotation, fabrication is forbidden, and the whole provided context
//! must be processed. The post-processor validates the same contract on
//! the way back.

/// Citation marker format the model must emit before every quotation.
pub const CITATION_FORMAT: &str = "[Documento: <archivo> | Timestamp: HH:MM:SS --> HH:MM:SS]";

/// Fixed system prompt with `{context}` and `{input}` interpolation slots.
pub const SYSTEM_PROMPT: &str = r#"Eres un analista forense de transcripciones. Tu única fuente de verdad son los fragmentos de subtítulos incluidos en la sección CONTEXTO; cada línea conserva su rango de tiempo original.

## Reglas obligatorias

1. Después de CADA afirmación sustantiva escribe UNA cita con el formato exacto:
   [Documento: <archivo> | Timestamp: HH:MM:SS --> HH:MM:SS]
   seguida inmediatamente de la transcripción literal entre comillas dobles.
2. La transcripción citada debe ser VERBATIM: copia el texto tal como aparece en el fragmento, sin corregirlo ni parafrasearlo.
3. Nunca inventes información. Si el contexto no contiene la respuesta, dilo explícitamente: "Los documentos disponibles no contienen información sobre esto."
4. Prohibido citar solo metadatos: un nombre de archivo sin su cita literal no es una respuesta.
5. Procesa TODOS los fragmentos del contexto antes de responder, no solo el primero.
6. Usa los rangos de tiempo que aparecen dentro de los fragmentos; no los alteres.
7. Responde en el idioma de la pregunta.

## CONTEXTO

{context}

## PREGUNTA

{input}

## RESPUESTA"#;

/// Builds the final prompt by filling both interpolation slots.
///
/// # Examples
///
/// ```
/// use testigo::pipeline::build_prompt;
///
/// let prompt = build_prompt("Documento: a.srt\n[00:00:01 --> 00:00:02] hola", "¿Quién saluda?");
/// assert!(prompt.contains("¿Quién saluda?"));
/// assert!(!prompt.contains("{context}"));
/// ```
#[must_use]
pub fn build_prompt(context: &str, input: &str) -> String {
    SYSTEM_PROMPT
        .replace("{context}", context)
        .replace("{input}", input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_not_empty() {
        assert!(!SYSTEM_PROMPT.is_empty());
        assert!(SYSTEM_PROMPT.contains("{context}"));
        assert!(SYSTEM_PROMPT.contains("{input}"));
    }

    #[test]
    fn test_prompt_declares_citation_format() {
        assert!(SYSTEM_PROMPT.contains("[Documento: <archivo> | Timestamp: HH:MM:SS --> HH:MM:SS]"));
        assert!(SYSTEM_PROMPT.contains("comillas dobles"));
    }

    #[test]
    fn test_build_prompt_fills_both_slots() {
        let prompt = build_prompt("CONTENIDO DE PRUEBA", "PREGUNTA DE PRUEBA");
        assert!(prompt.contains("CONTENIDO DE PRUEBA"));
        assert!(prompt.contains("PREGUNTA DE PRUEBA"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{input}"));
    }

    #[test]
    fn test_build_prompt_context_before_input() {
        let prompt = build_prompt("CTX", "PREG");
        let ctx_pos = prompt.find("CTX").unwrap();
        let input_pos = prompt.find("PREG").unwrap();
        assert!(ctx_pos < input_pos);
    }
}
