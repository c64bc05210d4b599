//! Dispatcher - runs a node over a batch of items
//!
//! Items are processed strictly in order; all network round-trips of one
//! item finish before the next item starts.

use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};

use eightkit_core::{Error, Result};

use crate::context::NodeContext;
use crate::node::{ErrorPolicy, InputItem, ItemOutcome, Node, NodeOutput};
use crate::params::Parameters;

/// Runs nodes against one execution context
pub struct Dispatcher {
    ctx: NodeContext,
}

impl Dispatcher {
    pub fn new(ctx: NodeContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    /// Run `node` over `items` and collect its outputs.
    pub async fn run(&self, node: &dyn Node, items: &[InputItem]) -> Result<NodeOutput> {
        let span = info_span!(
            "node_run",
            node = node.name(),
            execution_id = %self.ctx.execution_id()
        );
        self.run_items(node, items).instrument(span).await
    }

    async fn run_items(&self, node: &dyn Node, items: &[InputItem]) -> Result<NodeOutput> {
        let start = std::time::Instant::now();
        let first = items
            .first()
            .map(|item| item.parameters.clone())
            .unwrap_or_else(Parameters::new);
        let mut output = NodeOutput::new(node.output_names(&first));

        info!(items = items.len(), outputs = output.channels.len(), "Starting node execution");

        for (index, item) in items.iter().enumerate() {
            debug!(item_index = index, "Executing item");

            match node.execute_item(&self.ctx, index, item).await {
                Ok(outcome) => collect(&mut output, node.name(), index, outcome)?,
                Err(e) => match node.error_policy(&item.parameters)? {
                    ErrorPolicy::ContinueWithErrorItem => {
                        warn!(item_index = index, error = %e, "Item failed, continuing");
                        push(&mut output, node.name(), 0, error_item(item, &e))?;
                    }
                    ErrorPolicy::Abort => {
                        error!(item_index = index, error = %e, "Item failed, aborting run");
                        return Err(e);
                    }
                },
            }
        }

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            emitted = output.channels.iter().map(|c| c.items.len()).sum::<usize>(),
            "Node execution finished"
        );
        Ok(output)
    }
}

fn collect(output: &mut NodeOutput, node: &str, index: usize, outcome: ItemOutcome) -> Result<()> {
    match outcome {
        ItemOutcome::Skip => {
            debug!(item_index = index, "Item produced no output");
            Ok(())
        }
        ItemOutcome::Emit { output: channel, json } => push(output, node, channel, json),
        ItemOutcome::Routed(routed) => {
            for (channel, json) in routed {
                push(output, node, channel, json)?;
            }
            Ok(())
        }
    }
}

fn push(output: &mut NodeOutput, node: &str, channel: usize, json: Value) -> Result<()> {
    if is_empty_result(&json) {
        return Ok(());
    }
    let count = output.channels.len();
    let target = output.channels.get_mut(channel).ok_or_else(|| {
        Error::configuration(format!(
            "node '{}' routed an item to output {} but has {} output(s)",
            node, channel, count
        ))
    })?;
    target.items.push(json);
    Ok(())
}

/// `null` and `{}` are never emitted
fn is_empty_result(json: &Value) -> bool {
    match json {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn error_item(item: &InputItem, err: &Error) -> Value {
    let mut json = item.json_object();
    json.insert("error".to_string(), json!(err.to_string()));
    json.insert("success".to_string(), json!(false));
    Value::Object(json)
}
