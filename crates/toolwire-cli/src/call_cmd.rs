use serde_json::Value;

use toolwire_client::ToolClient;
use toolwire_core::ToolError;

/// Marker for a command whose failure has already been reported.
#[derive(Debug)]
pub struct Failed;

fn report(err: &ToolError) -> Failed {
    eprintln!("{}: {err}", err.kind());
    Failed
}

/// Invoke `tool` on `channel` and print the tool's text output.
pub async fn run(client: &ToolClient, channel: &str, tool: &str, args: &str) -> Result<(), Failed> {
    let arguments: Value = match serde_json::from_str(args) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            eprintln!("--args must be a JSON object");
            return Err(Failed);
        }
        Err(err) => {
            eprintln!("--args is not valid JSON: {err}");
            return Err(Failed);
        }
    };

    match client.call(channel, tool, arguments).await {
        Ok(output) => {
            println!("{}", output.display_text());
            Ok(())
        }
        Err(err) => Err(report(&err)),
    }
}

/// Print the tools offered on `channel` as JSON.
pub async fn list(client: &ToolClient, channel: &str) -> Result<(), Failed> {
    let tools = client.list_tools(channel).await.map_err(|err| report(&err))?;
    match serde_json::to_string_pretty(&tools) {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(err) => {
            eprintln!("cannot render tool listing: {err}");
            Err(Failed)
        }
    }
}
