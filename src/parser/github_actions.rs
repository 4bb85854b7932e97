//! GitHub Actions workflow and composite action parser

use tree_sitter::Node;
use tracing::warn;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DependencyReference, SourceLocation, is_github_actions_file};
use crate::patch::block::{ConfigBlock, scalar_to_value};

/// Parser for workflow files (.github/workflows/*.yml) and action.yml files
///
/// Extracts:
/// - `jobs.<id>.steps[*].uses` (plain references)
/// - `jobs.<id>.uses` (reusable workflows, composite flag set)
/// - `runs.steps[*].uses` (steps of composite actions, composite flag set)
#[derive(Default)]
pub struct GitHubActionsParser {
    file: Option<String>,
}

impl GitHubActionsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `file` in the location of every extracted reference
    pub fn for_file(file: &str) -> Self {
        Self {
            file: Some(file.to_string()),
        }
    }
}

impl Parser for GitHubActionsParser {
    fn can_parse(&self, uri: &str) -> bool {
        is_github_actions_file(uri)
    }

    fn parse(&self, content: &str) -> Result<Vec<DependencyReference>, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        let language = tree_sitter_yaml::LANGUAGE;
        parser.set_language(&language.into()).map_err(|e| {
            warn!("Failed to set YAML language for tree-sitter: {}", e);
            ParseError::TreeSitter(e.to_string())
        })?;

        let tree = parser.parse(content, None).ok_or_else(|| {
            warn!("Failed to parse YAML content");
            ParseError::ParseFailed("Failed to parse YAML".to_string())
        })?;

        let root = tree.root_node();
        let mut results = Vec::new();

        let mut cursor = root.walk();
        for document in root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "document")
        {
            let mut doc_cursor = document.walk();
            for body in document.named_children(&mut doc_cursor) {
                self.visit_document(body, content, &mut results);
            }
        }

        Ok(results)
    }
}

impl GitHubActionsParser {
    /// YAML tree structure of a workflow:
    /// ```text
    /// document
    ///   block_node
    ///     block_mapping
    ///       block_mapping_pair              <- "jobs: ..."
    ///         block_node
    ///           block_mapping
    ///             block_mapping_pair        <- "build: ..."
    ///               block_node
    ///                 block_mapping
    ///                   block_mapping_pair  <- "steps: ..."
    ///                     block_node
    ///                       block_sequence
    ///                         block_sequence_item
    ///                           block_node
    ///                             block_mapping   <- "uses: ...", "with: ..."
    /// ```
    fn visit_document(&self, node: Node, source: &str, results: &mut Vec<DependencyReference>) {
        for (key, value) in mapping_pairs(node) {
            match scalar_text(key, source).as_deref() {
                Some("jobs") => self.visit_jobs(value, source, results),
                Some("runs") => self.visit_steps_of(value, "runs", true, source, results),
                _ => {}
            }
        }
    }

    fn visit_jobs(&self, node: Node, source: &str, results: &mut Vec<DependencyReference>) {
        for (key, job) in mapping_pairs(node) {
            let Some(job_id) = scalar_text(key, source) else {
                continue;
            };
            let context = format!("jobs.{}", job_id);

            // Job-level `uses` calls a reusable workflow
            if let Some(reference) = self.reference_from_mapping(job, &context, true, source) {
                results.push(reference);
            }

            self.visit_steps_of(job, &context, false, source, results);
        }
    }

    /// Visit the `steps` sequence of a job or of a composite action's `runs`
    fn visit_steps_of(
        &self,
        node: Node,
        context: &str,
        is_composite: bool,
        source: &str,
        results: &mut Vec<DependencyReference>,
    ) {
        for (key, steps) in mapping_pairs(node) {
            if scalar_text(key, source).as_deref() != Some("steps") {
                continue;
            }
            for (i, step) in sequence_items(steps).into_iter().enumerate() {
                let step_context = format!("{}.steps[{}]", context, i);
                if let Some(reference) =
                    self.reference_from_mapping(step, &step_context, is_composite, source)
                {
                    results.push(reference);
                }
            }
        }
    }

    /// Build a reference from a mapping holding `uses` and optionally `with`
    fn reference_from_mapping(
        &self,
        node: Node,
        context: &str,
        is_composite: bool,
        source: &str,
    ) -> Option<DependencyReference> {
        let pairs = mapping_pairs(node);
        let uses_node = pairs
            .iter()
            .find(|(key, _)| scalar_text(*key, source).as_deref() == Some("uses"))
            .map(|(_, value)| *value)?;

        let mut reference = self.parse_uses_value(uses_node, source)?;
        reference.is_composite = is_composite;
        reference.context = context.to_string();

        if let Some((_, with_node)) = pairs
            .iter()
            .find(|(key, _)| scalar_text(*key, source).as_deref() == Some("with"))
        {
            reference.with = config_block(*with_node, source);
        }

        Some(reference)
    }

    /// Parse a 'uses' value into a DependencyReference
    ///
    /// # Arguments
    /// * `node` - The value node, e.g. for
    ///   - `actions/checkout@v4`
    ///   - `actions/checkout@8e5e7e5ab8b370d6c329ec480221332ada57f0ab`
    ///   - `actions/aws/ec2@v1`
    ///   - `org/shared/.github/workflows/build.yml@main`
    ///
    /// # Returns
    /// * `None` - For local (`./`) and `docker://` references, or values without `@`
    fn parse_uses_value(&self, node: Node, source: &str) -> Option<DependencyReference> {
        let value = scalar_text(node, source)?;
        if value.starts_with("./") || value.starts_with("docker://") {
            return None;
        }

        let (repo_part, version) = value.split_once('@')?;
        if version.is_empty() {
            return None;
        }

        let mut parts = repo_part.splitn(3, '/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let path = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

        let start = node.start_position();
        Some(DependencyReference {
            repository: format!("{}/{}", owner, repo),
            version: version.to_string(),
            is_composite: false,
            path,
            context: String::new(),
            location: SourceLocation {
                file: self.file.clone(),
                line: start.row + 1,
                column: start.column + 1,
            },
            with: ConfigBlock::new(),
        })
    }
}

/// Unwrap `block_node`/`flow_node` wrappers down to the node holding content
fn unwrap_node(mut node: Node) -> Node {
    while matches!(node.kind(), "block_node" | "flow_node") {
        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|c| !matches!(c.kind(), "comment" | "anchor" | "tag"));
        match inner {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Key/value node pairs of a block or flow mapping
fn mapping_pairs(node: Node) -> Vec<(Node, Node)> {
    let node = unwrap_node(node);
    if !matches!(node.kind(), "block_mapping" | "flow_mapping") {
        return vec![];
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "block_mapping_pair" | "flow_pair"))
        .filter_map(|pair| {
            Some((
                pair.child_by_field_name("key")?,
                pair.child_by_field_name("value")?,
            ))
        })
        .collect()
}

/// Items of a block or flow sequence
fn sequence_items(node: Node) -> Vec<Node> {
    let node = unwrap_node(node);
    let mut cursor = node.walk();
    match node.kind() {
        "block_sequence" => node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "block_sequence_item")
            .filter_map(|item| {
                let mut item_cursor = item.walk();
                item.named_children(&mut item_cursor)
                    .find(|c| c.kind() != "comment")
            })
            .collect(),
        "flow_sequence" => node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect(),
        _ => vec![],
    }
}

/// Scalar text with surrounding quotes removed, and whether it was quoted
fn scalar(node: Node, source: &str) -> Option<(String, bool)> {
    let node = unwrap_node(node);
    let text = source[node.byte_range()].trim();
    match node.kind() {
        "plain_scalar" => Some((text.to_string(), false)),
        "double_quote_scalar" => Some((
            text.trim_start_matches('"').trim_end_matches('"').to_string(),
            true,
        )),
        "single_quote_scalar" => Some((
            text.trim_start_matches('\'')
                .trim_end_matches('\'')
                .replace("''", "'"),
            true,
        )),
        _ => None,
    }
}

fn scalar_text(node: Node, source: &str) -> Option<String> {
    scalar(node, source).map(|(text, _)| text)
}

/// Convert a `with:` mapping into a configuration block. Non-scalar values
/// (block scalars, nested collections) are kept as their source text.
fn config_block(node: Node, source: &str) -> ConfigBlock {
    mapping_pairs(node)
        .into_iter()
        .filter_map(|(key, value)| {
            let key = scalar_text(key, source)?;
            let value = match scalar(value, source) {
                Some((text, quoted)) => scalar_to_value(&text, quoted),
                None => serde_json::Value::String(source[value.byte_range()].trim().to_string()),
            };
            Some((key, value))
        })
        .collect()
}
