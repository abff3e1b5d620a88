//! Descriptor-driven dialect

use super::descriptor::ArpDescriptor;
use super::{render_template, SqlDialect};
use crate::error::Result;
use std::collections::HashMap;

/// Dialect whose rules all come from an [`ArpDescriptor`]
#[derive(Debug)]
pub struct ArpDialect {
    descriptor: ArpDescriptor,
    types: HashMap<String, String>,
}

impl ArpDialect {
    pub fn load(resource: &str) -> Result<Self> {
        ArpDescriptor::load(resource).map(Self::new)
    }

    pub fn new(descriptor: ArpDescriptor) -> Self {
        let types = descriptor
            .data_types
            .iter()
            .map(|t| (t.engine.to_ascii_lowercase(), t.source.clone()))
            .collect();
        Self { descriptor, types }
    }

    pub fn descriptor(&self) -> &ArpDescriptor {
        &self.descriptor
    }

    fn operator(&self, name: &str, arity: usize) -> Option<&super::descriptor::OperatorMapping> {
        self.descriptor
            .operators
            .iter()
            .find(|op| op.name.eq_ignore_ascii_case(name) && op.args.map_or(true, |n| n == arity))
    }
}

impl SqlDialect for ArpDialect {
    fn name(&self) -> &str {
        &self.descriptor.metadata.name
    }

    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.descriptor.syntax.identifier_quote;
        let doubled: String = [quote, quote].iter().collect();
        format!("{q}{}{q}", name.replace(quote, &doubled), q = quote)
    }

    fn max_identifier_length(&self) -> Option<usize> {
        self.descriptor.syntax.identifier_length_limit
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        match (self.descriptor.syntax.allows_boolean_literal, value) {
            (true, true) => "TRUE",
            (true, false) => "FALSE",
            (false, true) => "1",
            (false, false) => "0",
        }
    }

    fn limit_offset_sql(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        let paging = &self.descriptor.relational_algebra.sort.fetch_offset;
        let (template, args) = match (limit, offset) {
            (None, None) => return Some(String::new()),
            (Some(l), None) => (paging.fetch_only.as_deref()?, vec![l.to_string()]),
            (None, Some(o)) => (paging.offset_only.as_deref()?, vec![o.to_string()]),
            (Some(l), Some(o)) => (
                paging.offset_fetch.as_deref()?,
                vec![o.to_string(), l.to_string()],
            ),
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Some(render_template(template, &args))
    }

    fn native_type(&self, engine_type: &str) -> Option<String> {
        self.types.get(&engine_type.to_ascii_lowercase()).cloned()
    }

    fn supports_function(&self, name: &str, arity: usize) -> bool {
        self.operator(name, arity).is_some()
    }

    fn render_function(&self, name: &str, args: &[String]) -> Option<String> {
        let op = self.operator(name, args.len())?;
        let sql = match op.rewrite.as_deref() {
            Some(template) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                render_template(template, &args)
            }
            None => format!("{}({})", op.name.to_uppercase(), args.join(", ")),
        };
        Some(sql)
    }
}
