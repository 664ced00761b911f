//! Prompt construction
//!
//! Pure function of brand, symbol, optional business description, optional
//! palette and optional edit instruction. The same inputs always produce the
//! same prompt.

/// Inputs for one prompt
#[derive(Debug, Clone, Default)]
pub struct PromptParts<'a> {
    pub brand: &'a str,
    pub symbol: &'a str,
    pub description: Option<&'a str>,
    pub palette: Option<&'a [String]>,
    pub edit_instruction: Option<&'a str>,
}

/// Build the generator prompt
pub fn build_prompt(parts: &PromptParts<'_>) -> String {
    let brand = parts.brand.trim();
    let symbol = parts.symbol.trim();

    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "You are a high-quality, professional logo generator for tech companies, websites, and apps.\n\
         Generate a clean, modern, icon-only logo for the brand \"{brand}\".\n\
         The logo must depict exactly: {symbol}.\n\
         Depict nothing beyond what this symbol description names."
    ));

    if let Some(description) = non_blank(parts.description) {
        sections.push(format!(
            "BUSINESS CONTEXT (FOR SYMBOLISM ONLY):\n\
             - {description}\n\
             - Use this ONLY to inform shapes and symbolism. Never render it as text in the image."
        ));
    }

    sections.push(color_rules(parts.palette));

    if let Some(instruction) = non_blank(parts.edit_instruction) {
        sections.push(format!(
            "EDIT INSTRUCTION:\n\
             - Keep the original concept, composition and style of the existing logo.\n\
             - Apply only this change: {instruction}"
        ));
    }

    sections.push(
        "OUTPUT REQUIREMENTS:\n\
         - Return a single centered icon on a fully transparent background (PNG with alpha=0).\n\
         - No borders, frames, canvases, mockups, or extra UI elements.\n\
         - Include ONLY elements specified by the symbol description."
            .to_string(),
    );

    sections.push(
        "STYLE CONSTRAINTS:\n\
         - Clean, modern, vector-like shapes. No photorealism, watermarks, signatures, or UI chrome.\n\
         - Center the icon with even padding on all sides."
            .to_string(),
    );

    sections.push(
        "ABSOLUTE TEXT BAN:\n\
         - Do NOT include text, letters, numbers, digits, monograms, or typographic marks."
            .to_string(),
    );

    sections.push(
        "NEGATIVE PROMPT:\n\
         no text, no letters, no numbers, no typography, no words, no monograms, no mockups, no watermarks."
            .to_string(),
    );

    sections.join("\n\n")
}

fn color_rules(palette: Option<&[String]>) -> String {
    let mut rules = String::from(
        "COLOR RULES:\n\
         - If the symbol description explicitly names colors for any element, use those exact colors for those elements.",
    );

    match palette.filter(|p| !p.is_empty()) {
        Some(colors) => {
            rules.push_str(&format!(
                "\n- Color every element the symbol description leaves unspecified from this palette: {}.",
                colors.join(", ")
            ));
        }
        None => {
            rules.push_str(
                "\n- If colors are not specified, choose a tasteful minimal palette (monochrome or duotone) with strong contrast.",
            );
        }
    }

    rules.push_str("\n- Avoid gradients unless explicitly requested. Prefer solid fills and simple strokes.");
    rules
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(palette: Option<&'a [String]>) -> PromptParts<'a> {
        PromptParts {
            brand: "Acme",
            symbol: "a red fox head, flat icon",
            description: None,
            palette,
            edit_instruction: None,
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let palette = vec!["#FF0000".to_string(), "#222222".to_string()];
        let a = build_prompt(&parts(Some(&palette)));
        let b = build_prompt(&parts(Some(&palette)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_names_symbol_and_bans_text() {
        let prompt = build_prompt(&parts(None));
        assert!(prompt.contains("depict exactly: a red fox head, flat icon"));
        assert!(prompt.contains("ABSOLUTE TEXT BAN"));
        assert!(prompt.contains("letters, numbers, digits"));
        assert!(prompt.contains("fully transparent background"));
        assert!(prompt.contains("No borders, frames"));
        assert!(prompt.contains("watermarks"));
    }

    #[test]
    fn test_description_is_symbolism_only() {
        let mut s = parts(None);
        s.description = Some("  eco-friendly delivery  ");
        let prompt = build_prompt(&s);
        assert!(prompt.contains("- eco-friendly delivery\n"));
        assert!(prompt.contains("Never render it as text"));

        s.description = Some("   ");
        assert!(!build_prompt(&s).contains("BUSINESS CONTEXT"));
    }

    #[test]
    fn test_palette_is_fallback_and_symbol_colors_win() {
        let palette = vec!["#FF0000".to_string(), "#222222".to_string()];
        let prompt = build_prompt(&parts(Some(&palette)));
        assert!(prompt.contains("explicitly names colors for any element, use those exact colors"));
        assert!(prompt.contains("leaves unspecified from this palette: #FF0000, #222222."));

        let without = build_prompt(&parts(None));
        assert!(!without.contains("from this palette"));
        assert!(without.contains("tasteful minimal palette"));
    }

    #[test]
    fn test_edit_instruction_section() {
        let mut s = parts(None);
        assert!(!build_prompt(&s).contains("EDIT INSTRUCTION"));

        s.edit_instruction = Some("make the ears pointier");
        let prompt = build_prompt(&s);
        assert!(prompt.contains("EDIT INSTRUCTION"));
        assert!(prompt.contains("Apply only this change: make the ears pointier"));
    }
}
