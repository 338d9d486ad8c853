//! Minimal MCP child process, used by the integration tests and handy
//! for poking at a running bridge.
//!
//! Speaks line-delimited JSON on stdin/stdout: `initialize` gets a
//! capabilities result, every other method gets its own method and
//! params echoed back as the result. Params come back verbatim, so a
//! caller can observe exactly what the bridge injected.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

fn respond(request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    let result = match method {
        "initialize" => json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "serverInfo": {
                "name": "mcp-echo",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        _ => json!({
            "method": method,
            "params": request.get("params").cloned().unwrap_or(Value::Null),
        }),
    };

    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn main() -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Value>(&line) {
            Ok(request) => respond(&request),
            Err(err) => json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32700, "message": err.to_string()},
            }),
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }

    Ok(())
}
