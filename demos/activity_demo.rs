//! Demonstrates registering a schema and executor on an HSTP node and
//! driving one activity from `CREATED` to `COMPLETED`.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use hstp_node::activity::{ActivityExecutor, ActivitySchema, DataType, ExecutionContext, ExecutionEvent, VariableDefinition};
use hstp_node::config::NodeConfig;
use hstp_node::did::Did;
use hstp_node::domain_types::ExecutorPluginId;
use hstp_node::node::NodeBuilder;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct GreeterExecutor;

#[async_trait]
impl ActivityExecutor for GreeterExecutor {
    fn plugin_id(&self) -> &ExecutorPluginId {
        static ID: std::sync::OnceLock<ExecutorPluginId> = std::sync::OnceLock::new();
        ID.get_or_init(|| ExecutorPluginId::try_new("greeter").unwrap())
    }

    async fn execute(
        &self,
        activity: &hstp_node::activity::Activity,
        _schema: &ActivitySchema,
        _context: ExecutionContext,
    ) -> BoxStream<'static, ExecutionEvent> {
        let name = activity
            .input
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("there")
            .to_string();
        let events = vec![
            ExecutionEvent::Started,
            ExecutionEvent::Output(BTreeMap::from([("message".to_string(), json!(format!("Hello, {name}!")))])),
            ExecutionEvent::Completed {
                output: None,
                duration_ms: Some(1),
            },
        ];
        stream::iter(events).boxed()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let node_id: Did = "did:example:greeter-node".parse()?;
    let node = NodeBuilder::new(NodeConfig::development(node_id)).build();

    node.activities().register_executor(Arc::new(GreeterExecutor));
    node.activities()
        .register_schema(ActivitySchema {
            id: "greeting-activity".to_string().try_into()?,
            name: "greeting-activity".to_string(),
            version: "1.0.0".to_string(),
            category: "demo".to_string(),
            executor_plugin_id: ExecutorPluginId::try_new("greeter")?,
            input_schema: BTreeMap::from([(
                "name".to_string(),
                VariableDefinition::new("name", "name").required().of_type(DataType::String),
            )]),
            output_schema: BTreeMap::new(),
            constraints: Default::default(),
            metadata: BTreeMap::new(),
        })
        .await?;

    let activity = node
        .activities()
        .start_activity(
            "greeting-activity".to_string().try_into()?,
            BTreeMap::from([("name".to_string(), json!("world"))]),
            "demo-caller",
            None,
        )
        .await?;

    for _ in 0..50 {
        if let Some(snapshot) = node.activities().get_activity(activity.id) {
            if snapshot.status.is_terminal() {
                println!("activity {} finished as {:?}", snapshot.id, snapshot.status);
                println!("output: {:?}", snapshot.output);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    node.shutdown().await;
    Ok(())
}
