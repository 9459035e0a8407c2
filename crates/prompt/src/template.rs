//! Story-string template engine.
//!
//! The story string is Handlebars text. It is compiled once per invocation,
//! checked against the closed [`Directive`] set, then rendered with every
//! directive (and only the directives) registered as helpers:
//!
//! - literal text passes through unescaped
//! - `{{field}}` substitutes a fragment; missing fragments render empty
//! - `{{directive arg ...}}` expands an inline directive
//! - `{{#trim}}...{{/trim}}` post-processes its rendered body
//!
//! Helper-style invocations of anything outside the directive set, partials,
//! decorators and `{{else}}` branches are rejected before rendering.

use handlebars::template::{HelperTemplate, Parameter, Template, TemplateElement};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, JsonValue, RenderContext, RenderError, Renderable,
    ScopedJson,
};
use naix_core::{AppError, AppResult};

use crate::fragments::Fragments;
use crate::helpers::{Directive, Invocation, Value};

/// Reference appended to every story string so the model-specific cache
/// always ends the prompt.
pub const CACHE_SUFFIX: &str = " {{generatedPromptCache}}";

const TEMPLATE_NAME: &str = "story";

/// Helpers Handlebars registers by default. None of them are directives.
const BUILTIN_HELPERS: [&str; 17] = [
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte",
    "and", "or", "not", "len",
];

/// A parsed, validated story string ready to render.
pub struct StoryTemplate {
    registry: Handlebars<'static>,
    directives: Vec<Directive>,
}

impl StoryTemplate {
    /// Parse a story string, appending the cache reference.
    ///
    /// Fails with [`AppError::Template`] on grammar errors and on any
    /// invocation that does not resolve to a directive.
    pub fn parse(story_string: &str) -> AppResult<Self> {
        let source = format!("{}{}", story_string, CACHE_SUFFIX);

        let template = Template::compile(&source)
            .map_err(|e| AppError::Template(format!("Failed to parse story string: {}", e)))?;

        let mut directives = Vec::new();
        validate_elements(&template.elements, &mut directives)?;

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for name in BUILTIN_HELPERS {
            registry.unregister_helper(name);
        }
        for directive in Directive::ALL {
            registry.register_helper(directive.name(), Box::new(DirectiveHelper(directive)));
            registry.register_helper(directive.alias(), Box::new(DirectiveHelper(directive)));
        }
        registry.register_template(TEMPLATE_NAME, template);

        tracing::debug!(
            "Parsed story string ({} bytes, {} directive invocations)",
            source.len(),
            directives.len()
        );

        Ok(Self {
            registry,
            directives,
        })
    }

    /// Directives invoked by the template, in source order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Expand the template against a fragment mapping and trim the result.
    pub fn render(&self, fragments: &Fragments) -> AppResult<String> {
        let rendered = self
            .registry
            .render(TEMPLATE_NAME, fragments)
            .map_err(|e| AppError::Template(format!("Failed to render story string: {}", e)))?;

        Ok(rendered.trim().to_string())
    }
}

/// Parse and render in one step.
pub fn expand_story(story_string: &str, fragments: &Fragments) -> AppResult<String> {
    StoryTemplate::parse(story_string)?.render(fragments)
}

fn validate_elements(elements: &[TemplateElement], used: &mut Vec<Directive>) -> AppResult<()> {
    elements
        .iter()
        .try_for_each(|element| validate_element(element, used))
}

fn validate_element(element: &TemplateElement, used: &mut Vec<Directive>) -> AppResult<()> {
    match element {
        TemplateElement::RawString(_) | TemplateElement::Comment(_) => Ok(()),
        TemplateElement::Expression(ht) | TemplateElement::HtmlExpression(ht) => {
            validate_expression(ht, used)
        }
        TemplateElement::HelperBlock(ht) => validate_block(ht, used),
        TemplateElement::PartialExpression(_) | TemplateElement::PartialBlock(_) => Err(
            AppError::Template("Partials are not supported in the story string".to_string()),
        ),
        _ => Err(AppError::Template(
            "Decorators are not supported in the story string".to_string(),
        )),
    }
}

fn validate_expression(ht: &HelperTemplate, used: &mut Vec<Directive>) -> AppResult<()> {
    let is_call = !ht.params.is_empty() || !ht.hash.is_empty();
    validate_inline(ht, is_call, used)
}

/// Check an inline expression. `is_call` marks forms Handlebars always
/// dispatches to a helper; otherwise a non-directive name is a field.
fn validate_inline(
    ht: &HelperTemplate,
    is_call: bool,
    used: &mut Vec<Directive>,
) -> AppResult<()> {
    let Some(name) = ht.name.as_name() else {
        return validate_param(&ht.name, used);
    };

    match Directive::from_name(name) {
        Some(directive) if directive.is_block() => Err(AppError::Template(format!(
            "'{}' is a block directive and must be used as {{{{#{}}}}}...{{{{/{}}}}}",
            name, name, name
        ))),
        Some(directive) => {
            used.push(directive);
            validate_params(ht, used)
        }
        None if is_call => Err(AppError::Template(format!("Unknown directive '{}'", name))),
        // a plain fragment reference
        None => Ok(()),
    }
}

fn validate_block(ht: &HelperTemplate, used: &mut Vec<Directive>) -> AppResult<()> {
    let name = ht.name.as_name().unwrap_or_default();

    let directive = match Directive::from_name(name) {
        Some(directive) if directive.is_block() => directive,
        Some(_) => {
            return Err(AppError::Template(format!(
                "'{}' is an inline directive and cannot open a block",
                name
            )))
        }
        None => return Err(AppError::Template(format!("Unknown directive '{}'", name))),
    };

    if ht.inverse.is_some() {
        return Err(AppError::Template(format!(
            "'{}' does not support an {{{{else}}}} branch",
            name
        )));
    }

    used.push(directive);
    validate_params(ht, used)?;
    match ht.template {
        Some(ref body) => validate_elements(&body.elements, used),
        None => Ok(()),
    }
}

fn validate_params(ht: &HelperTemplate, used: &mut Vec<Directive>) -> AppResult<()> {
    ht.params
        .iter()
        .chain(ht.hash.values())
        .try_for_each(|param| validate_param(param, used))
}

fn validate_param(param: &Parameter, used: &mut Vec<Directive>) -> AppResult<()> {
    match param {
        // a subexpression is a helper call even without arguments
        Parameter::Subexpression(sub) => match sub.as_element() {
            TemplateElement::Expression(ht) | TemplateElement::HtmlExpression(ht) => {
                validate_inline(ht, true, used)
            }
            element => validate_element(element, used),
        },
        _ => Ok(()),
    }
}

/// Bridges one [`Directive`] into the Handlebars helper registry.
#[derive(Clone, Copy)]
struct DirectiveHelper(Directive);

impl HelperDef for DirectiveHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let directive = self.0;
        let invocation = Invocation {
            name: h.name(),
            block: h.is_block(),
        };
        tracing::trace!(
            "Expanding {} as '{}' (block: {})",
            directive,
            invocation.name,
            invocation.block
        );

        let expanded = if directive.is_block() {
            let body = match h.template() {
                Some(template) => template.renders(r, ctx, rc)?,
                None => String::new(),
            };
            directive.apply_block(&body)
        } else {
            let args: Vec<Value> = h
                .params()
                .iter()
                .map(|p| Value::from_json(p.value(), p.is_value_missing()))
                .collect();
            directive.apply(&args, &invocation)
        };

        Ok(ScopedJson::Derived(JsonValue::String(expanded)))
    }
}
