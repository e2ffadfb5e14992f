//! Instruction templates and conversation assembly for every model call.
//!
//! All prompt text lives here so a wording change touches exactly one file
//! and tests can inspect the templates without a model. Callers may replace
//! a template through [`crate::config::GenerationConfig::specification_prompt`]
//! or [`crate::config::GenerationConfig::website_prompt`]; the constants are
//! used only when no override is given.
//!
//! A conversation is always two entries: the fixed instruction for the phase
//! as the system turn, then the body (resume text, prompt, or specification)
//! as the user turn.

use crate::pipeline::parse::BlockLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-phase instruction: prompt or resume text straight to site code.
///
/// Uses the `javascript` label for the script block.
pub const DIRECT_WEBSITE_PROMPT: &str = r#"You are an expert web developer who builds professional websites.
Create the HTML, CSS and JavaScript code for a frontend based on the user's prompt.

The output must contain only clean code, in exactly this format:

--html--
<html code>
--html--

--css--
<css code>
--css--

--javascript--
<javascript code>
--javascript--"#;

/// Phase 1 of the two-phase flow: resume text to a website specification.
pub const RESUME_TO_SPECIFICATION_PROMPT: &str = r#"You are a senior web designer preparing a brief for a personal portfolio website.
Read the resume provided by the user and write a structured specification of the site.

Cover, in this order:
1. Name and headline (one line that sums the person up)
2. Short professional bio (2-4 sentences, first person)
3. Skills, grouped by category
4. Experience: role, organisation, dates, two or three highlights each
5. Projects: name, one-line description, technologies, links if present
6. Achievements and awards
7. Education
8. Contact information (email, phone, location, profile links) exactly as given
9. Design style inferred from the profession and tone: colour palette,
   typography mood, layout density, and any section that deserves emphasis

Rules:
- Write prose and bullet points only. Do NOT write any HTML, CSS or JavaScript.
- Do not invent employers, dates, degrees or contact details that are not in the resume.
- Omit a section entirely when the resume has nothing for it."#;

/// Phase 2 of the two-phase flow: specification to site code.
///
/// Uses the `js` label for the script block.
pub const SPECIFICATION_TO_WEBSITE_PROMPT: &str = r#"You are an expert frontend developer. Build a complete, responsive, static portfolio website from the specification provided by the user.

Requirements:
- HTML: a single semantic HTML5 document (header, nav, main, section, footer) that
  links "style.css" and "script.js" by those exact relative names.
- CSS: a separate stylesheet that imports one web font (Google Fonts @import),
  defines colour variables, is responsive down to mobile widths, and has hover
  states for links, buttons and cards.
- JavaScript: vanilla JS only, no frameworks. Include where useful: smooth
  scrolling for in-page links, a mobile navigation toggle, accordion behaviour
  for collapsible sections.
- Use only the content from the specification; do not add placeholder people.

Output format (strict):
Return exactly three blocks and nothing else — no explanations, no Markdown fences.

--html--
<complete html document>
--html--

--css--
<complete stylesheet>
--css--

--js--
<complete script>
--js--"#;

/// The three kinds of model call the pipeline makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// One-phase flow: input text straight to site code.
    Direct,
    /// Two-phase flow, first call: resume to specification.
    ResumeToSpecification,
    /// Two-phase flow, second call: specification to site code.
    SpecificationToWebsite,
}

impl Phase {
    /// Built-in instruction template for this phase.
    pub fn default_instruction(&self) -> &'static str {
        match self {
            Phase::Direct => DIRECT_WEBSITE_PROMPT,
            Phase::ResumeToSpecification => RESUME_TO_SPECIFICATION_PROMPT,
            Phase::SpecificationToWebsite => SPECIFICATION_TO_WEBSITE_PROMPT,
        }
    }

    /// Label of the script block the phase's template asks for.
    ///
    /// `None` for the specification phase, which returns prose.
    pub fn script_label(&self) -> Option<BlockLabel> {
        match self {
            Phase::Direct => Some(BlockLabel::Javascript),
            Phase::SpecificationToWebsite => Some(BlockLabel::Js),
            Phase::ResumeToSpecification => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Direct => "direct generation",
            Phase::ResumeToSpecification => "resume → specification",
            Phase::SpecificationToWebsite => "specification → website",
        })
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
}

/// One role-tagged turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Ordered list of turns sent in a single model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub phase: Phase,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// The instruction turn.
    pub fn instruction(&self) -> &str {
        self.content_of(Role::System)
    }

    /// The body turn.
    pub fn user_turn(&self) -> &str {
        self.content_of(Role::User)
    }

    fn content_of(&self, role: Role) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Build the two-entry conversation for `phase`.
///
/// `instruction` replaces the built-in template when `Some`.
pub fn build_conversation(phase: Phase, body: &str, instruction: Option<&str>) -> Conversation {
    let instruction = instruction.unwrap_or_else(|| phase.default_instruction());
    Conversation {
        phase,
        messages: vec![
            Message {
                role: Role::System,
                content: instruction.to_string(),
            },
            Message {
                role: Role::User,
                content: body.to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_is_instruction_then_body() {
        let conv = build_conversation(Phase::Direct, "a bakery landing page", None);
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0].role, Role::System);
        assert_eq!(conv.messages[1].role, Role::User);
        assert_eq!(conv.instruction(), DIRECT_WEBSITE_PROMPT);
        assert_eq!(conv.user_turn(), "a bakery landing page");
    }

    #[test]
    fn override_replaces_template() {
        let conv = build_conversation(Phase::ResumeToSpecification, "cv", Some("be brief"));
        assert_eq!(conv.instruction(), "be brief");
        assert_eq!(conv.phase, Phase::ResumeToSpecification);
    }

    #[test]
    fn site_templates_name_their_markers() {
        for phase in [Phase::Direct, Phase::SpecificationToWebsite] {
            let template = phase.default_instruction();
            let script = phase.script_label().unwrap();
            for label in [BlockLabel::Html, BlockLabel::Css, script] {
                assert_eq!(
                    template.matches(label.marker().as_str()).count(),
                    2,
                    "{phase}: expected an opening and closing {}",
                    label.marker()
                );
            }
        }
    }

    #[test]
    fn direct_uses_javascript_label_two_phase_uses_js() {
        assert_eq!(Phase::Direct.script_label(), Some(BlockLabel::Javascript));
        assert_eq!(
            Phase::SpecificationToWebsite.script_label(),
            Some(BlockLabel::Js)
        );
        assert!(!SPECIFICATION_TO_WEBSITE_PROMPT.contains("--javascript--"));
    }

    #[test]
    fn specification_template_forbids_code() {
        assert_eq!(Phase::ResumeToSpecification.script_label(), None);
        assert!(RESUME_TO_SPECIFICATION_PROMPT.contains("Do NOT write any HTML"));
        assert!(!RESUME_TO_SPECIFICATION_PROMPT.contains("--html--"));
    }
}
