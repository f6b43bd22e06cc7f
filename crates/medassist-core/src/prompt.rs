//! System prompts and fixed patient-facing texts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reply language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish
    #[default]
    Es,
    /// English
    En,
}

impl Language {
    /// ISO 639-1 code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Self::Es),
            "en" | "english" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

const BASE_PROMPT_ES: &str = "\
Eres un asistente médico especializado en el tratamiento de la obesidad con medicamentos GLP-1 (como Ozempic/Semaglutide).

RESPONSABILIDADES:
- Proporcionar información precisa sobre tratamientos GLP-1
- Ayudar con técnicas de inyección y manejo de efectos secundarios
- Ofrecer orientación sobre expectativas del tratamiento
- Detectar situaciones que requieren atención médica inmediata

LIMITACIONES IMPORTANTES:
- NO puedes diagnosticar condiciones médicas
- NO puedes cambiar dosis de medicamentos
- SIEMPRE recomienda consultar con el médico para decisiones médicas importantes
- Mantén un tono profesional pero empático

Responde en español de manera clara y comprensible. Incluye el aviso médico cuando sea apropiado.";

const BASE_PROMPT_EN: &str = "\
You are a medical assistant specialized in obesity treatment with GLP-1 medications (like Ozempic/Semaglutide).

RESPONSIBILITIES:
- Provide accurate information about GLP-1 treatments
- Help with injection techniques and side effect management
- Offer guidance on treatment expectations
- Detect situations requiring immediate medical attention

IMPORTANT LIMITATIONS:
- You CANNOT diagnose medical conditions
- You CANNOT change medication doses
- ALWAYS recommend consulting with a doctor for important medical decisions
- Maintain a professional but empathetic tone

Respond in English clearly and understandably. Include a medical disclaimer when appropriate.";

const CONTEXT_HEADER_ES: &str = "INFORMACIÓN RELEVANTE:";
const CONTEXT_HEADER_EN: &str = "RELEVANT INFORMATION:";

const SAFETY_FALLBACK_ES: &str = "No puedo ofrecer una respuesta segura a esta consulta. \
Por favor consulte con su médico tratante o, si se trata de una urgencia, acuda a un servicio de emergencias.";

const SAFETY_FALLBACK_EN: &str = "I cannot give a safe answer to this question. \
Please consult with your doctor, or seek emergency care if this is urgent.";

/// Fixed medical-assistant instructions followed by the rendered context
#[must_use]
pub fn build_system_prompt(language: Language, context: &str) -> String {
    let (base, header) = match language {
        Language::Es => (BASE_PROMPT_ES, CONTEXT_HEADER_ES),
        Language::En => (BASE_PROMPT_EN, CONTEXT_HEADER_EN),
    };

    if context.trim().is_empty() {
        return base.to_string();
    }
    format!("{base}\n\n{header}\n{context}")
}

/// Human-authored reply shown instead of a reply that failed validation
#[must_use]
pub fn safety_fallback(language: Language) -> &'static str {
    match language {
        Language::Es => SAFETY_FALLBACK_ES,
        Language::En => SAFETY_FALLBACK_EN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_system_prompt(Language::En, "  ");
        assert!(prompt.starts_with("You are a medical assistant"));
        assert!(!prompt.contains(CONTEXT_HEADER_EN));
    }

    #[test]
    fn test_prompt_appends_context() {
        let prompt = build_system_prompt(Language::Es, "## Relevant Procedure\nStep 1: Rotate sites");
        assert!(prompt.contains("INFORMACIÓN RELEVANTE:\n## Relevant Procedure"));
        assert!(prompt.ends_with("Step 1: Rotate sites"));
    }

    #[test]
    fn test_fallback_mentions_doctor() {
        assert!(safety_fallback(Language::Es).contains("consulte con su médico"));
        assert!(safety_fallback(Language::En).contains("consult with your doctor"));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("español".parse::<Language>().unwrap(), Language::Es);
        assert!("fr".parse::<Language>().is_err());
    }
}
