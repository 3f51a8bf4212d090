use crate::{
    error::{Error, Result},
    template::Template,
};
use serde::Serialize;
use tera::{Context, Tera};

const INSTRUCTIONS: &str = "instructions";

const BUILTIN_INSTRUCTIONS: &str = "You are a content formatter. \
Format the given content according to this template: {{ template }}.\n\
Maintain the original meaning while adapting it to the template structure.";

const SENTINEL: &str = "__llm_comply_template_content__";

#[derive(Serialize)]
struct InstructionContext<'a> {
    template: &'a str,
    name: &'a str,
    warning_words: &'a [String],
}

/// Renders the system instructions sent alongside the user's text.
#[derive(Debug)]
pub(crate) struct InstructionRenderer {
    tera: Tera,
}

impl InstructionRenderer {
    /// Creates a renderer from the built-in instructions or `custom`.
    ///
    /// # Errors
    ///
    /// Returns an error if the custom template does not parse.
    pub(crate) fn new(custom: Option<&str>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INSTRUCTIONS, custom.unwrap_or(BUILTIN_INSTRUCTIONS))
            .map_err(|e| Error::template(INSTRUCTIONS, e))?;
        Ok(Self { tera })
    }

    /// Checks that a custom instruction template parses, renders, and
    /// actually includes the template content.
    pub(crate) fn validate_source(source: &str) -> Result<()> {
        let renderer = Self::new(Some(source))?;
        let rendered = renderer.render_parts(SENTINEL, "", &[])?;
        if !rendered.contains(SENTINEL) {
            return Err(Error::config(
                "Instruction template must reference {{ template }}",
            ));
        }
        Ok(())
    }

    /// Renders the instructions for `template`.
    pub(crate) fn render(&self, template: &Template) -> Result<String> {
        self.render_parts(&template.content, &template.name, &template.warning_words)
    }

    fn render_parts(&self, content: &str, name: &str, warning_words: &[String]) -> Result<String> {
        let ctx = InstructionContext {
            template: content,
            name,
            warning_words,
        };
        let context = Context::from_serialize(&ctx).map_err(|e| Error::template(INSTRUCTIONS, e))?;

        self.tera
            .render(INSTRUCTIONS, &context)
            .map_err(|e| Error::template(INSTRUCTIONS, e))
    }
}
