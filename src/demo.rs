//! Client-side demo of the learning server.
//!
//! The demo starts an in-process server, connects a [`McpClient`] to it and
//! walks through tools, resources and prompts, printing what it does. With
//! `--interactive` it then reads commands from stdin until `quit`.

use std::io::Write;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};

use crate::error::ClientError;
use crate::mcp::client::{in_process, McpClient};
use crate::mcp::dispatcher::Dispatcher;

const CLIENT_NAME: &str = "mcp-learning-demo";

const HELP: &str = "Commands:
  tools                     List available tools
  resources                 List available resources
  prompts                   List available prompts
  call <tool> [json]        Call a tool, e.g. call add_task {\"title\": \"Read docs\"}
  read <uri>                Read a resource, e.g. read tasks://database
  prompt <name> [json]      Render a prompt, e.g. prompt explain_concept {\"concept\": \"tools\"}
  help                      Show this help
  quit | exit               Leave the demo";

/// A command typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoCommand {
    /// List tools.
    Tools,
    /// List resources.
    Resources,
    /// List prompts.
    Prompts,
    /// Call a tool.
    Call {
        /// Tool name.
        tool: String,
        /// Tool arguments.
        arguments: Value,
    },
    /// Read a resource.
    Read {
        /// Resource URI.
        uri: String,
    },
    /// Render a prompt.
    Prompt {
        /// Prompt name.
        name: String,
        /// Prompt arguments.
        arguments: Value,
    },
    /// Show help.
    Help,
    /// Leave the session.
    Quit,
}

/// Why an interactive command could not be parsed.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The first word is not a known command.
    #[error("unknown command '{command}'")]
    Unknown {
        /// What was typed.
        command: String,
    },

    /// A required argument was not given.
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        /// The command.
        command: &'static str,
        /// The missing argument.
        argument: &'static str,
    },

    /// The trailing JSON did not parse.
    #[error("invalid JSON arguments")]
    InvalidJson(#[source] serde_json::Error),
}

impl DemoCommand {
    /// Parses one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing what is wrong with the line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word {
            "tools" => Self::Tools,
            "resources" => Self::Resources,
            "prompts" => Self::Prompts,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "read" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "read",
                        argument: "resource URI",
                    });
                }
                Self::Read {
                    uri: rest.to_string(),
                }
            }
            "call" => {
                let (tool, arguments) = name_and_arguments("call", "tool name", rest)?;
                Self::Call { tool, arguments }
            }
            "prompt" => {
                let (name, arguments) = name_and_arguments("prompt", "prompt name", rest)?;
                Self::Prompt { name, arguments }
            }
            other => {
                return Err(CommandError::Unknown {
                    command: other.to_string(),
                })
            }
        };

        Ok(Some(command))
    }
}

fn name_and_arguments(
    command: &'static str,
    argument: &'static str,
    rest: &str,
) -> Result<(String, Value), CommandError> {
    let (name, json) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, j)| (n, j.trim()));

    if name.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }

    let arguments = if json.is_empty() {
        json!({})
    } else {
        serde_json::from_str(json).map_err(CommandError::InvalidJson)?
    };

    Ok((name.to_string(), arguments))
}

/// Runs the demo against an in-process server, printing to stdout.
///
/// # Errors
///
/// Returns an error if the session breaks down (I/O failure or an
/// unexpected protocol error).
pub async fn run(dispatcher: Dispatcher, interactive: bool) -> Result<(), ClientError> {
    let (mut server, mut client) = in_process(dispatcher);

    let (served, session) = tokio::join!(server.serve(), async {
        let mut out = std::io::stdout();
        let mut result = client.initialize(CLIENT_NAME).await.map(|_| ());
        if result.is_ok() {
            result = scripted_session(&mut client, &mut out).await;
        }
        if result.is_ok() && interactive {
            let input = BufReader::new(tokio::io::stdin());
            result = interactive_session(&mut client, input, &mut out).await;
        }
        let closed = client.close().await;
        result.and(closed)
    });

    served?;
    session
}

/// Walks through every capability once.
///
/// # Errors
///
/// Returns an error if a request fails or output cannot be written.
pub async fn scripted_session<R, W, O>(
    client: &mut McpClient<R, W>,
    out: &mut O,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    O: Write,
{
    writeln!(out, "🚀 WELCOME TO MCP LEARNING PLAYGROUND!")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Model Context Protocol (MCP) enables AI assistants to:")?;
    writeln!(out, "• Call tools to perform actions")?;
    writeln!(out, "• Read resources to access data")?;
    writeln!(out, "• Use prompts for templated interactions")?;
    writeln!(out)?;

    section(out, "🔧 MCP TOOLS DEMONSTRATION")?;
    for tool in client.list_tools().await? {
        writeln!(out, "  • {}: {}", str_field(&tool, "name"), str_field(&tool, "description"))?;
    }
    writeln!(out)?;

    let calls = [
        ("📝", "add_task", json!({"title": "Test MCP integration"})),
        ("📋", "list_tasks", json!({})),
        ("✔️", "complete_task", json!({"task_id": 1})),
        ("🧮", "evaluate", json!({"expression": "15 + 25 * 2"})),
        ("➗", "calculate", json!({"operation": "divide", "a": 84, "b": 2})),
        ("🌤️", "get_weather", json!({"city": "San Francisco"})),
    ];
    for (icon, tool, arguments) in calls {
        writeln!(out, "{icon} Tool: {tool} {arguments}")?;
        let result = client.call_tool(tool, arguments).await?;
        writeln!(out, "{}", indent(&tool_text(&result)))?;
        writeln!(out)?;
    }

    section(out, "📚 MCP RESOURCES DEMONSTRATION")?;
    let resources = client.list_resources().await?;
    for resource in &resources {
        writeln!(out, "  • {} ({})", str_field(resource, "uri"), str_field(resource, "name"))?;
    }
    writeln!(out)?;

    for resource in &resources {
        let uri = str_field(resource, "uri");
        writeln!(out, "📖 Resource: {uri}")?;
        let result = client.read_resource(uri).await?;
        writeln!(out, "{}", indent(&preview(&resource_text(&result), 200)))?;
        writeln!(out)?;
    }

    section(out, "💭 MCP PROMPTS DEMONSTRATION")?;
    for prompt in client.list_prompts().await? {
        writeln!(out, "  • {}: {}", str_field(&prompt, "name"), str_field(&prompt, "description"))?;
    }
    writeln!(out)?;

    let prompts = [
        ("📋", "task_summary", json!({"include_completed": "false"})),
        ("🎓", "learning_plan", json!({"skill_level": "beginner", "focus_area": "tools"})),
        ("💡", "explain_concept", json!({"concept": "resources"})),
    ];
    for (icon, name, arguments) in prompts {
        writeln!(out, "{icon} Prompt: {name} {arguments}")?;
        let result = client.get_prompt(name, arguments).await?;
        writeln!(out, "{}", indent(&preview(&prompt_text(&result), 150)))?;
        writeln!(out)?;
    }

    writeln!(out, "🎉 CONGRATULATIONS!")?;
    writeln!(out, "{}", "=".repeat(20))?;
    writeln!(out, "You've seen all three core MCP concepts in action:")?;
    writeln!(out, "✅ Tools - Functions that perform actions")?;
    writeln!(out, "✅ Resources - Data sources for reading")?;
    writeln!(out, "✅ Prompts - Templates for AI interactions")?;
    writeln!(out)?;

    Ok(())
}

/// Reads commands from `input` until EOF or `quit`.
///
/// Server-side errors are printed and the loop continues.
///
/// # Errors
///
/// Returns an error if reading input, writing output or the transport
/// fails.
pub async fn interactive_session<R, W, I, O>(
    client: &mut McpClient<R, W>,
    input: I,
    out: &mut O,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
    O: Write,
{
    writeln!(out, "Interactive mode. Type 'help' for commands.")?;
    let mut lines = input.lines();

    loop {
        write!(out, "mcp> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match DemoCommand::parse(&line) {
            Ok(Some(DemoCommand::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}. Type 'help' for commands.")?;
                continue;
            }
        };

        match execute(client, command).await {
            Ok(text) => writeln!(out, "{text}")?,
            Err(ClientError::Rpc { code, message }) => writeln!(out, "Error {code}: {message}")?,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

async fn execute<R, W>(
    client: &mut McpClient<R, W>,
    command: DemoCommand,
) -> Result<String, ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let text = match command {
        DemoCommand::Tools => listing(&client.list_tools().await?, "name", "description"),
        DemoCommand::Resources => listing(&client.list_resources().await?, "uri", "name"),
        DemoCommand::Prompts => listing(&client.list_prompts().await?, "name", "description"),
        DemoCommand::Call { tool, arguments } => {
            let result = client.call_tool(&tool, arguments).await?;
            let text = tool_text(&result);
            if result["isError"].as_bool().unwrap_or(false) {
                format!("[tool error] {text}")
            } else {
                text
            }
        }
        DemoCommand::Read { uri } => resource_text(&client.read_resource(&uri).await?),
        DemoCommand::Prompt { name, arguments } => {
            prompt_text(&client.get_prompt(&name, arguments).await?)
        }
        DemoCommand::Help => HELP.to_string(),
        DemoCommand::Quit => String::new(),
    };
    Ok(text)
}

fn section<O: Write>(out: &mut O, title: &str) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))
}

fn listing(items: &[Value], key: &str, detail: &str) -> String {
    items
        .iter()
        .map(|item| format!("  {} - {}", str_field(item, key), str_field(item, detail)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn tool_text(result: &Value) -> String {
    result["content"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

fn resource_text(result: &Value) -> String {
    result["contents"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn prompt_text(result: &Value) -> String {
    result["messages"][0]["content"]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::dispatcher::DispatcherBuilder;

    fn dispatcher(notes_dir: &std::path::Path) -> Dispatcher {
        Dispatcher::builder()
            .register_builtin_tools()
            .and_then(|b| b.register_builtin_resources(notes_dir))
            .and_then(DispatcherBuilder::register_builtin_prompts)
            .unwrap()
            .build()
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(DemoCommand::parse("  tools ").unwrap(), Some(DemoCommand::Tools));
        assert_eq!(DemoCommand::parse("exit").unwrap(), Some(DemoCommand::Quit));
        assert_eq!(DemoCommand::parse("").unwrap(), None);
        assert_eq!(
            DemoCommand::parse("read tasks://database").unwrap(),
            Some(DemoCommand::Read {
                uri: "tasks://database".to_string()
            })
        );
    }

    #[test]
    fn parse_call_with_json() {
        let command = DemoCommand::parse(r#"call add_task {"title": "Read the docs"}"#).unwrap();
        assert_eq!(
            command,
            Some(DemoCommand::Call {
                tool: "add_task".to_string(),
                arguments: json!({"title": "Read the docs"}),
            })
        );

        let bare = DemoCommand::parse("call list_tasks").unwrap();
        assert_eq!(
            bare,
            Some(DemoCommand::Call {
                tool: "list_tasks".to_string(),
                arguments: json!({}),
            })
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            DemoCommand::parse("dance"),
            Err(CommandError::Unknown { .. })
        ));
        assert!(matches!(
            DemoCommand::parse("read"),
            Err(CommandError::MissingArgument { command: "read", .. })
        ));
        assert!(matches!(
            DemoCommand::parse("prompt learning_plan {oops"),
            Err(CommandError::InvalidJson(_))
        ));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("⏳⏳⏳", 2), "⏳⏳...");
        assert_eq!(preview("short", 10), "short");
    }

    #[tokio::test]
    async fn scripted_session_covers_everything() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("intro.md"), "# Intro").unwrap();
        let (mut server, mut client) = in_process(dispatcher(temp.path()));

        let mut out = Vec::new();
        let (served, session) = tokio::join!(server.serve(), async {
            client.initialize("test").await?;
            scripted_session(&mut client, &mut out).await?;
            client.close().await
        });
        served.unwrap();
        session.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Task 'Test MCP integration' added with ID 1"));
        assert!(text.contains("15 + 25 * 2 = 65"));
        assert!(text.contains("84 / 2 = 42"));
        assert!(text.contains("# Intro"));
        assert!(text.contains("🎉 CONGRATULATIONS!"));
        assert_eq!(server.dispatcher().store().len(), 1);
    }

    #[tokio::test]
    async fn interactive_session_reports_errors_and_quits() {
        let temp = tempfile::tempdir().unwrap();
        let (mut server, mut client) = in_process(dispatcher(temp.path()));

        let input: &[u8] = b"call add_task {\"title\": \"typed\"}\nprompt nope\nbogus\nquit\ntools\n";
        let mut out = Vec::new();
        let (served, session) = tokio::join!(server.serve(), async {
            client.initialize("test").await?;
            interactive_session(&mut client, BufReader::new(input), &mut out).await?;
            client.close().await
        });
        served.unwrap();
        session.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Task 'typed' added with ID 1"));
        assert!(text.contains("Error -32602: Unknown prompt: nope"));
        assert!(text.contains("unknown command 'bogus'"));
        assert!(!text.contains("add_task - "));
    }
}
