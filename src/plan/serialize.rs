use crate::plan::error::PlanResult;
use crate::plan::node::PlanTreeNode;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Borrowed view that writes one node in the decision service's layout.
struct JsonNode<'a>(&'a PlanTreeNode);

impl Serialize for JsonNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Node Type", node.kind().name())?;
        map.serialize_entry("Node Type ID", &node.tag)?;
        if let Some(relation) = &node.relation_name {
            map.serialize_entry("Relation Name", relation)?;
        }
        map.serialize_entry("Total Cost", &node.total_cost)?;
        map.serialize_entry("Plan Rows", &node.row_estimate)?;
        if node.left.is_some() || node.right.is_some() {
            let children: Vec<JsonNode<'_>> = node.children().map(JsonNode).collect();
            map.serialize_entry("Plans", &children)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    #[serde(rename = "Plan")]
    plan: JsonNode<'a>,
}

/// Serialize a plan tree as `{"Plan": <node>}`.
pub fn plan_to_json(plan: &PlanTreeNode) -> PlanResult<String> {
    Ok(serde_json::to_string(&PlanDocument {
        plan: JsonNode(plan),
    })?)
}

#[derive(Deserialize)]
struct ParsedNode {
    #[serde(rename = "Node Type ID")]
    tag: u32,
    #[serde(rename = "Relation Name")]
    relation_name: Option<String>,
    #[serde(rename = "Total Cost")]
    total_cost: f64,
    #[serde(rename = "Plan Rows")]
    row_estimate: f64,
    #[serde(rename = "Plans", default)]
    plans: Vec<ParsedNode>,
}

#[derive(Deserialize)]
struct ParsedDocument {
    #[serde(rename = "Plan")]
    plan: ParsedNode,
}

impl ParsedNode {
    fn into_tree(self) -> PlanTreeNode {
        let mut plans = self.plans.into_iter().map(Self::into_tree);
        PlanTreeNode {
            tag: self.tag,
            total_cost: self.total_cost,
            row_estimate: self.row_estimate,
            relation_name: self.relation_name,
            left: plans.next().map(Box::new),
            right: plans.next().map(Box::new),
        }
    }
}

/// Read back the structural fields of a serialized plan.
pub fn plan_from_json(json: &str) -> PlanResult<PlanTreeNode> {
    let document: ParsedDocument = serde_json::from_str(json)?;
    Ok(document.plan.into_tree())
}
