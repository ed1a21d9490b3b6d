use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use filebroker_app::{Dispatcher, Services, serve_connection};
use filebroker_config::{BrokerConfig, LogFormatSetting, LoggingSettings};
use filebroker_fsops::MemoryClipboard;
use filebroker_protocol::{Value, ValueSet};
use filebroker_telemetry::Metrics;
use filebroker_test_support::{TempTree, file_operation, with_request_id};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::test]
async fn connection_answers_each_request_line() -> anyhow::Result<()> {
    let tree = TempTree::new()?;
    let config = BrokerConfig {
        endpoint: "unused".to_string(),
        recycle_dir: Some(tree.join(".recycle")),
        link_resolve_timeout: Duration::from_millis(100),
        acknowledge_link_writes: false,
        logging: LoggingSettings {
            level: "info".to_string(),
            format: LogFormatSetting::Auto,
        },
    };
    let clipboard = Arc::new(MemoryClipboard::new());
    let dispatcher =
        Dispatcher::new(Services::with_clipboard(&config, Metrics::new()?, clipboard)?);
    let present = tree.write_file("present.txt", "x")?;

    let (client, server) = tokio::io::duplex(16 * 1024);
    let server_task = tokio::spawn(serve_connection(server, dispatcher));

    let requests = [
        with_request_id(
            file_operation(
                "DeleteItem",
                [("filepath", Value::from(present.as_path())), ("permanently", Value::Bool(true))],
            ),
            "ok",
        ),
        with_request_id(
            file_operation(
                "DeleteItem",
                [
                    ("filepath", Value::from(tree.join("absent.txt").as_path())),
                    ("permanently", Value::Bool(true)),
                ],
            ),
            "missing",
        ),
        with_request_id(file_operation("Unheard", [("filepath", "/tmp")]), "ignored"),
    ];

    let (reader, mut writer) = tokio::io::split(client);
    for request in &requests {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
    }
    writer.write_all(b"{not json\n\n").await?;
    writer.shutdown().await?;

    let mut answers = HashMap::new();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let message: ValueSet = serde_json::from_str(&line)?;
        let id = message
            .get("RequestID")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        answers.insert(id, message.get("Success").and_then(Value::as_bool));
    }
    server_task.await??;

    assert_eq!(answers.len(), 2);
    assert_eq!(answers.get("ok"), Some(&Some(true)));
    assert_eq!(answers.get("missing"), Some(&Some(false)));
    assert!(!present.exists());
    assert!(!tree.exists(".recycle/present.txt"));
    Ok(())
}
