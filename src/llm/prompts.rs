//! Instruction templates for the two enrichment passes.
//!
//! `{text}` is replaced with the paper abstract. Both prompts target
//! Chinese output but keep domain terms untranslated, matching the
//! digest's intended audience.

pub const TRANSLATION_PROMPT: &str = "You will be given the abstract of a computer-science \
paper. Translate it into fluent Chinese. Leave domain terms such as transformer, token and \
logit untranslated.\n{text}";

pub const CONTRIBUTION_PROMPT: &str = "You will be given the abstract of a computer-science \
paper. Summarize its core contribution in a single fluent Chinese sentence, in the form \
\"used X to solve Y\". Leave domain terms such as transformer, token and logit untranslated.\n{text}";
