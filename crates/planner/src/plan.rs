use std::fmt;

use parser::types::{OperationType, VariableDefinition};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{stringify, types::SelectionRefSet};

/// A response path locating where a fetch's output attaches. `@` segments
/// mark list fan-out: the executor maps representations element-wise there.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ResponsePath<'a>(Vec<PathSegment<'a>>);

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathSegment<'a> {
    pub name: &'a str,
    pub is_list: bool,
}

impl<'a> ResponsePath<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, segment: PathSegment<'a>) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment<'a>> {
        self.0.iter()
    }
}

impl fmt::Display for ResponsePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.name)?;
            if segment.is_list {
                f.write_str(".@")?;
            }
        }
        Ok(())
    }
}

impl Serialize for ResponsePath<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The planner's result: a tree of per-service fetches, immutable once
/// emitted. `node` is `None` for operations with nothing to fetch.
#[derive(Debug)]
pub struct QueryPlan<'a> {
    pub node: Option<PlanNode<'a>>,
}

#[derive(Debug)]
pub enum PlanNode<'a> {
    Sequence(SequenceNode<'a>),
    Parallel(ParallelNode<'a>),
    Fetch(FetchNode<'a>),
    Flatten(FlattenNode<'a>),
}

#[derive(Debug)]
pub struct SequenceNode<'a> {
    pub nodes: Vec<PlanNode<'a>>,
}

#[derive(Debug)]
pub struct ParallelNode<'a> {
    pub nodes: Vec<PlanNode<'a>>,
}

/// One GraphQL request to one downstream service.
///
/// When `requires` is present the executor collects one representation per
/// entity at the current path and passes them through the `representations`
/// variable of an `_entities` query.
#[derive(Debug)]
pub struct FetchNode<'a> {
    pub service: &'a str,
    pub entity_type: Option<&'a str>,
    pub operation_kind: OperationType,
    pub variable_usages: Vec<&'a str>,
    pub variable_definitions: Vec<&'a VariableDefinition>,
    pub requires: Option<SelectionRefSet<'a>>,
    pub selection_set: SelectionRefSet<'a>,
    pub internal_fragments: Vec<InternalFragment<'a>>,
}

#[derive(Debug)]
pub struct InternalFragment<'a> {
    pub name: String,
    pub type_condition: &'a str,
    pub selection_set: SelectionRefSet<'a>,
}

#[derive(Debug)]
pub struct FlattenNode<'a> {
    pub path: ResponsePath<'a>,
    pub node: Box<PlanNode<'a>>,
}

impl<'a> PlanNode<'a> {
    /// Wrap nodes in a `Sequence`, collapsing single children and splicing
    /// nested sequences in place.
    pub fn sequence(nodes: Vec<PlanNode<'a>>) -> Option<PlanNode<'a>> {
        Self::collection(nodes, true)
    }

    /// Wrap nodes in a `Parallel`, collapsing single children and splicing
    /// nested parallels in place.
    pub fn parallel(nodes: Vec<PlanNode<'a>>) -> Option<PlanNode<'a>> {
        Self::collection(nodes, false)
    }

    fn collection(nodes: Vec<PlanNode<'a>>, sequence: bool) -> Option<PlanNode<'a>> {
        let mut flat = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                PlanNode::Sequence(SequenceNode { nodes }) if sequence => flat.extend(nodes),
                PlanNode::Parallel(ParallelNode { nodes }) if !sequence => flat.extend(nodes),
                node => flat.push(node),
            }
        }

        if flat.len() <= 1 {
            flat.pop()
        } else if sequence {
            Some(PlanNode::Sequence(SequenceNode { nodes: flat }))
        } else {
            Some(PlanNode::Parallel(ParallelNode { nodes: flat }))
        }
    }
}

impl Serialize for QueryPlan<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("node", &self.node)?;
        map.end()
    }
}

impl Serialize for PlanNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlanNode::Sequence(node) => node.serialize(serializer),
            PlanNode::Parallel(node) => node.serialize(serializer),
            PlanNode::Fetch(node) => node.serialize(serializer),
            PlanNode::Flatten(node) => node.serialize(serializer),
        }
    }
}

impl Serialize for SequenceNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "sequence")?;
        map.serialize_entry("nodes", &self.nodes)?;
        map.end()
    }
}

impl Serialize for ParallelNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "parallel")?;
        map.serialize_entry("nodes", &self.nodes)?;
        map.end()
    }
}

impl Serialize for FetchNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "fetch")?;
        map.serialize_entry("service", self.service)?;
        map.serialize_entry("variableUsages", &self.variable_usages)?;
        if let Some(requires) = &self.requires {
            map.serialize_entry("requires", &stringify::selection_set_text(requires))?;
        }
        map.serialize_entry("query", &stringify::fetch_query(self))?;
        map.end()
    }
}

impl Serialize for FlattenNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "flatten")?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("node", &*self.node)?;
        map.end()
    }
}
